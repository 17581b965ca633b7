mod context;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use context::{load_context, unused_entries, unused_warning};
use stagecraft_diagnostics::Emitter;
use stagecraft_gen::{Context, Generator, GeneratorOptions, StagingError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "stagecraft")]
#[command(about = "分段代码生成器 - 用上下文特化函数模板", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 生成代码
    Build {
        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        context: ContextArgs,

        /// 输出文件 (默认: 标准输出)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 生成代码并执行，打印最后一个表达式的值
    Eval {
        #[command(flatten)]
        template: TemplateArgs,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// 打印编译出的生成程序
    Listing {
        #[command(flatten)]
        template: TemplateArgs,
    },
}

#[derive(Args)]
struct TemplateArgs {
    /// 模板文件 (一个函数定义)
    input: PathBuf,

    /// 内联所有分段名字，包括循环绑定
    #[arg(long)]
    inline_all: bool,

    /// 内联指定的名字
    #[arg(long, value_name = "NAME", conflicts_with = "inline_all")]
    inline: Vec<String>,

    /// 把指定名字的值当作原样代码插入
    #[arg(long, value_name = "NAME")]
    replace: Vec<String>,
}

#[derive(Args)]
struct ContextArgs {
    /// JSON 上下文文件
    #[arg(short, long, value_name = "FILE")]
    context: Option<PathBuf>,

    /// 单个上下文值，可重复
    #[arg(long = "set", value_name = "NAME=JSON")]
    set: Vec<String>,
}

impl TemplateArgs {
    fn options(&self) -> GeneratorOptions {
        let mut options = GeneratorOptions::new();
        if self.inline_all {
            options = options.inline_all();
        }
        for name in &self.inline {
            options = options.inline(name.clone());
        }
        for name in &self.replace {
            options = options.replace(name.clone());
        }
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Build {
            template,
            context,
            output,
        } => cmd_build(&template, &context, output.as_deref())?,
        Commands::Eval { template, context } => cmd_eval(&template, &context)?,
        Commands::Listing { template } => cmd_listing(&template)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// 读取模板并编译
fn load_template(args: &TemplateArgs) -> Result<(String, Generator)> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    tracing::info!(input = %args.input.display(), "loading template");

    match Generator::new(&source, args.options()) {
        Ok(generator) => Ok((source, generator)),
        Err(err) => report(&err, &source),
    }
}

fn warn_unused(context: &Context, generator: &Generator) {
    let emitter = Emitter::new();
    for name in unused_entries(context, generator.registry()) {
        emitter.emit(&unused_warning(name));
    }
}

// 打印诊断并以错误码 1 退出
fn report(err: &StagingError, source: &str) -> ! {
    Emitter::new().emit_with_source(&err.to_diagnostic(), source);
    std::process::exit(1);
}

/// 生成命令
fn cmd_build(template: &TemplateArgs, context: &ContextArgs, output: Option<&Path>) -> Result<()> {
    let (source, generator) = load_template(template)?;
    let context = load_context(context.context.as_deref(), &context.set)?;
    warn_unused(&context, &generator);

    let code = generator
        .build(&context)
        .unwrap_or_else(|err| report(&err, &source));

    match output {
        Some(path) => {
            fs::write(path, &code)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), bytes = code.len(), "wrote generated code");
        }
        None => println!("{}", code),
    }
    Ok(())
}

/// 执行命令
fn cmd_eval(template: &TemplateArgs, context: &ContextArgs) -> Result<()> {
    let (source, generator) = load_template(template)?;
    let context = load_context(context.context.as_deref(), &context.set)?;
    warn_unused(&context, &generator);

    let value = generator
        .evaluate(&context)
        .unwrap_or_else(|err| report(&err, &source));
    println!("{}", value);
    Ok(())
}

/// 清单命令
fn cmd_listing(template: &TemplateArgs) -> Result<()> {
    let (source, generator) = load_template(template)?;
    let program = generator
        .program()
        .unwrap_or_else(|err| report(&err, &source));
    println!("{}", program);
    Ok(())
}
