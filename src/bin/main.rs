use anyhow::{Context, Result};
use argsplice::codegen::{opcodes, resolve, Insn, InsnList, MethodDescriptor, Target, Type};
use argsplice::inject::{HandlerRef, HandlerShapes};
use argsplice::Config;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "argsplice")]
#[command(about = "Call-site argument interception for JVM method bodies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the argument descriptors of a method descriptor
    Resolve {
        /// Method descriptor, e.g. (IJLjava/lang/String;)V
        #[arg(value_name = "DESC")]
        desc: String,
    },

    /// Rewrite a synthetic call and print the resulting listing
    Preview {
        /// Owner of the intercepted method
        #[arg(long, default_value = "demo/Callee")]
        owner: String,

        /// Name of the intercepted method
        #[arg(long, default_value = "call")]
        name: String,

        /// Descriptor of the intercepted method
        #[arg(long, value_name = "DESC")]
        desc: String,

        /// The intercepted method is static
        #[arg(long)]
        static_call: bool,

        /// Descriptor of the enclosing method
        #[arg(long, value_name = "DESC", default_value = "()V")]
        target_desc: String,

        /// The enclosing method is static
        #[arg(long)]
        static_target: bool,

        /// Handler method name
        #[arg(long, default_value = "modifyArgs")]
        handler: String,

        /// The handler is static
        #[arg(long)]
        static_handler: bool,

        /// The handler is private
        #[arg(long)]
        private_handler: bool,

        /// Declare the handler in long form (bundle plus enclosing arguments)
        #[arg(long)]
        long_form: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve { desc } => resolve_desc(&desc)?,
        Commands::Preview {
            owner,
            name,
            desc,
            static_call,
            target_desc,
            static_target,
            handler,
            static_handler,
            private_handler,
            long_form,
        } => {
            let config = Config::from_env()?;
            let call = CallSpec {
                owner,
                name,
                desc,
                is_static: static_call,
            };
            let mut target = synthetic_target(&call, &target_desc, static_target)?;
            let shapes = HandlerShapes::for_target(&config.args_class, &target);
            let handler_desc = if long_form { shapes.long } else { shapes.short };
            let mut handler = HandlerRef::new(&target.owner, &handler, &handler_desc);
            if static_handler {
                handler = handler.as_static();
            }
            if private_handler {
                handler = handler.as_private();
            }
            preview(&mut target, handler, &config)?;
        }
    }

    Ok(())
}

fn resolve_desc(desc: &str) -> Result<()> {
    let args = resolve(desc).with_context(|| format!("resolving {}", desc))?;
    if args.is_empty() {
        println!("(no arguments)");
    }
    for arg in args {
        println!(
            "{}: {} ({}, {} slot{})",
            arg.index,
            arg.ty,
            if arg.is_primitive() { "primitive" } else { "reference" },
            arg.width(),
            if arg.width() == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

struct CallSpec {
    owner: String,
    name: String,
    desc: String,
    is_static: bool,
}

/// `[null receiver,] zero arguments, call, drop result, return`
fn synthetic_target(call: &CallSpec, target_desc: &str, static_target: bool) -> Result<Target> {
    let parsed = MethodDescriptor::parse(&call.desc).with_context(|| format!("parsing {}", call.desc))?;
    let mut insns = InsnList::new();
    if !call.is_static {
        insns.add(Insn::op(opcodes::ACONST_NULL));
    }
    for ty in &parsed.args {
        insns.add(Insn::op(zero_constant(ty)));
    }
    let opcode = if call.is_static { opcodes::INVOKESTATIC } else { opcodes::INVOKEVIRTUAL };
    insns.add(Insn::invoke(opcode, &call.owner, &call.name, &call.desc));
    match parsed.ret.size() {
        1 => {
            insns.add(Insn::op(opcodes::POP));
        }
        2 => {
            insns.add(Insn::op(opcodes::POP2));
        }
        _ => {}
    }
    insns.add(Insn::op(opcodes::RETURN));
    Ok(Target::new("demo/Preview", "preview", target_desc, static_target, insns)?)
}

fn zero_constant(ty: &Type) -> u8 {
    match ty {
        Type::Long => opcodes::LCONST_0,
        Type::Float => opcodes::FCONST_0,
        Type::Double => opcodes::DCONST_0,
        Type::Object(_) | Type::Array(_) => opcodes::ACONST_NULL,
        _ => opcodes::ICONST_0,
    }
}

fn preview(target: &mut Target, handler: HandlerRef, config: &Config) -> Result<()> {
    let call = target
        .insns
        .iter()
        .find(|(_, insn)| insn.as_method().is_some())
        .map(|(id, _)| id)
        .context("synthetic target has no call")?;
    let before = target.max_stack;
    argsplice::modify_args(target, call, handler, config)?;

    println!("{}", target);
    print!("{}", target.insns);
    println!("max stack: {} -> {}", before, target.max_stack);
    Ok(())
}
