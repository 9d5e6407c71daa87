use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context as AnyhowContext;
use clap::{Args, Parser, Subcommand};
use flexi_logger::{FileSpec, LevelFilter, LogSpecification, Logger, LoggerHandle, WriteMode};

use emufs::config::StorageConfig;
use emufs::{AbiSupport, DefaultContext, DocumentTree, OpenMode, ProcessIdentifier};

#[derive(Args)]
struct Resolve {
    /// Virtual path to resolve
    path: String,
}

#[derive(Args)]
struct Ls {
    /// Directory to list, defaults to the root
    path: Option<String>,
}

#[derive(Args)]
struct Stat {
    /// Path to inspect
    path: String,
    /// Print as JSON
    #[arg(long, action = clap::ArgAction::SetTrue, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
struct Touch {
    /// Parent directory, created if missing
    parent: String,
    /// Name of the new file
    name: String,
}

#[derive(Args)]
struct Mkdir {
    /// Parent directory, created if missing
    parent: String,
    /// Name of the new directory
    name: String,
}

#[derive(Args)]
struct Mv {
    /// Path to rename
    from: String,
    /// New path
    to: String,
}

#[derive(Args)]
struct Rm {
    /// File or empty directory to remove
    path: String,
}

#[derive(Args)]
struct Cp {
    source: String,
    destination_parent: String,
    destination_name: String,
}

#[derive(Args)]
struct WriteFile {
    /// File to write stdin into
    path: String,
    /// Open mode: w, wt, wa, rw or rwt
    #[arg(short, long, default_value = "w")]
    mode: String,
}

#[derive(Args)]
struct StorageArgs {
    /// Storage root, overrides EMUFS_ROOT and the config file
    #[arg(short = 'r', long, global = true)]
    root: Option<PathBuf>,

    /// Package identifier marking already resolved paths, overrides
    /// EMUFS_PACKAGE and the config file
    #[arg(short = 'p', long, global = true)]
    package: Option<String>,
}

#[derive(Parser)]
#[command(name = "emufs")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    #[arg(
        short = 'e',
        long,
        help = "Ignore --log-file and log to stderr, which is already the default without it",
        action = clap::ArgAction::SetTrue,
        default_value_t = false
    )]
    log_stderr: bool,

    #[arg(short = 'f', long, help = "Send log output to the given file")]
    log_file: Option<PathBuf>,

    #[arg(short = 's', long, help = "Log spec for flexi_logger")]
    log_spec: Option<String>,

    #[arg(
        short = 'l',
        long,
        help = "Set the log level, 0 = warn, 1 = info, etc",
        default_value_t = 0
    )]
    log_level: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the filesystem path a virtual path resolves to
    Resolve(Resolve),
    /// List a directory
    Ls(Ls),
    /// Show size and type of a path
    Stat(Stat),
    /// Create an empty file
    Touch(Touch),
    /// Create a directory
    Mkdir(Mkdir),
    /// Rename a file or directory
    Mv(Mv),
    /// Remove a file or empty directory
    Rm(Rm),
    /// Copy a file (not supported)
    Cp(Cp),
    /// Write stdin into a file opened with the given mode
    Write(WriteFile),
    /// Print the current process name
    ProcName,
    /// Print the supported CPU ABIs
    Abi,
}

impl Cli {
    fn configure_loggers(&self) -> anyhow::Result<LoggerHandle> {
        let log_spec = match &self.log_spec {
            Some(s) => {
                LogSpecification::parse(s).with_context(|| format!("parsing log spec {}", s))?
            }
            None => {
                if self.log_level > 0 {
                    let lvl = match self.log_level {
                        1 => LevelFilter::Info,
                        2 => LevelFilter::Debug,
                        _ => LevelFilter::Trace,
                    };
                    LogSpecification::builder().module("emufs", lvl).build()
                } else {
                    LogSpecification::env().with_context(|| "getting log spec from env")?
                }
            }
        };

        let mut logger = Logger::with(log_spec);

        if !self.log_stderr {
            if let Some(v) = &self.log_file {
                let path = if v.is_absolute() {
                    v.clone()
                } else {
                    std::env::current_dir()?.join(v)
                };
                logger = logger
                    .log_to_file(FileSpec::try_from(path).with_context(|| "creating filespec")?)
                    .append()
                    .write_mode(WriteMode::BufferAndFlush);
            }
        }

        Ok(logger.start().with_context(|| "starting logger")?)
    }
}

impl StorageArgs {
    fn document_tree(&self, ctx: &DefaultContext) -> anyhow::Result<DocumentTree> {
        let (root, package) = match (&self.root, &self.package) {
            (Some(root), Some(package)) => (Some(root.clone()), package.clone()),
            _ => {
                let cfg = StorageConfig::from_context(ctx).with_context(|| {
                    "no package given, pass --package or set EMUFS_PACKAGE"
                })?;
                (self.root.clone().or(cfg.root), self.package.clone().unwrap_or(cfg.package))
            }
        };

        log::debug!("package {}, root {:?}", package, root);
        let mut tree = DocumentTree::new(package);
        let root = root.with_context(|| "no storage root, pass --root or set EMUFS_ROOT")?;
        tree.set_root(&root)
            .with_context(|| format!("setting root {}", root.display()))?;
        Ok(tree)
    }
}

fn resolve(tree: &DocumentTree, args: Resolve) -> anyhow::Result<()> {
    let path = tree.classify(&args.path);
    let resolved = tree.resolve(&path)?;
    println!("{}", resolved.display());
    Ok(())
}

fn ls(tree: &DocumentTree, args: Ls) -> anyhow::Result<()> {
    let path = args.path.as_deref().unwrap_or("");
    for name in tree.list(path)? {
        println!("{name}");
    }
    Ok(())
}

fn stat(tree: &DocumentTree, args: Stat) -> anyhow::Result<()> {
    let info = tree.stat(&args.path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    let kind = match (info.exists, info.is_directory) {
        (false, _) => "missing",
        (true, true) => "directory",
        (true, false) => "file",
    };
    println!("{}\t{}\t{}", kind, info.size, info.path.display());
    Ok(())
}

fn write(tree: &DocumentTree, args: WriteFile) -> anyhow::Result<()> {
    let mode = OpenMode::parse(&args.mode)?;
    if !mode.write {
        anyhow::bail!("mode `{}` does not allow writing", args.mode);
    }
    let mut file = tree
        .open(&args.path, mode)
        .with_context(|| format!("opening {}", args.path))?;
    io::copy(&mut io::stdin().lock(), &mut file)?;
    file.flush()?;
    Ok(())
}

fn proc_name() -> anyhow::Result<()> {
    let ident = ProcessIdentifier::system();
    match ident.current_process_name() {
        Some(name) => println!("{name}"),
        None => anyhow::bail!("unable to determine the process name"),
    }
    Ok(())
}

fn abi(ctx: &DefaultContext) -> anyhow::Result<()> {
    let cfg = emufs::config::AbiConfig::from_context(ctx)?;
    let abis = AbiSupport::from_context(ctx, &cfg);
    println!("supported: {}", abis.supported().join(","));
    println!("supported-64: {}", abis.supported_64().join(","));
    println!("64-bit: {}", abis.supports_64_bit());
    println!("x86: {}", abis.supports_x86());
    Ok(())
}

fn run(cli: Cli, ctx: &DefaultContext) -> anyhow::Result<()> {
    let Cli {
        storage, command, ..
    } = cli;
    let tree = || storage.document_tree(ctx);

    match command {
        Commands::ProcName => proc_name(),
        Commands::Abi => abi(ctx),
        Commands::Resolve(args) => resolve(&tree()?, args),
        Commands::Ls(args) => ls(&tree()?, args),
        Commands::Stat(args) => stat(&tree()?, args),
        Commands::Touch(args) => {
            let created = tree()?.create_file(&args.parent, &args.name)?;
            println!("{}", created.display());
            Ok(())
        }
        Commands::Mkdir(args) => {
            let created = tree()?.create_dir(&args.parent, &args.name)?;
            println!("{}", created.display());
            Ok(())
        }
        Commands::Mv(args) => Ok(tree()?.rename(&args.from, &args.to)?),
        Commands::Rm(args) => Ok(tree()?.delete(&args.path)?),
        Commands::Cp(args) => Ok(tree()?.copy_file(
            &args.source,
            &args.destination_parent,
            &args.destination_name,
        )?),
        Commands::Write(args) => write(&tree()?, args),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let ctx = DefaultContext::new();

    let log_handle = cli.configure_loggers()?;
    let res = run(cli, &ctx);
    log_handle.flush();
    res
}
