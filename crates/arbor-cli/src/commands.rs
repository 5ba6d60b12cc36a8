use std::fs::File;
use std::io::{self, Read, Write};

use anyhow::Context;
use colored::Colorize;

use arbor_db::Database;
use arbor_types::{Algorithm, ObjectPath};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let algorithm: Algorithm = cli
        .algo
        .parse()
        .with_context(|| format!("unsupported --algo {:?}", cli.algo))?;

    if let Command::Init(args) = &cli.command {
        return cmd_init(&cli.db, args.depth);
    }

    let db = Database::open(&cli.db)
        .with_context(|| format!("cannot open database at {:?}", cli.db))?;
    match cli.command {
        Command::Init(_) => unreachable!("handled above"),
        Command::PutBlock(args) => cmd_put_block(&db, algorithm, args),
        Command::Cat(args) => cmd_cat(&db, args),
        Command::Put(args) => cmd_put(&db, algorithm, args),
        Command::Append(args) => cmd_append(&db, args),
        Command::Ls(args) => cmd_ls(&db, args),
        Command::Verify(args) => cmd_verify(&db, args),
        Command::Rm(args) => cmd_rm(&db, args),
        Command::Stat(args) => cmd_stat(&db, args),
    }
}

// An address containing a slash must parse as a store address; a bare
// word is taken as a stream label.
fn resolve(db: &Database, address: &str) -> anyhow::Result<ObjectPath> {
    if address.contains('/') {
        Ok(db.resolve(address)?)
    } else {
        Ok(ObjectPath::stream(address))
    }
}

fn open_input(file: &str) -> anyhow::Result<Box<dyn Read>> {
    if file == "-" {
        Ok(Box::new(io::stdin()))
    } else {
        let handle = File::open(file).with_context(|| format!("cannot open {file:?}"))?;
        Ok(Box::new(handle))
    }
}

fn read_input(file: &str) -> anyhow::Result<Vec<u8>> {
    let mut data = Vec::new();
    open_input(file)?
        .read_to_end(&mut data)
        .with_context(|| format!("cannot read {file:?}"))?;
    Ok(data)
}

fn cmd_init(dir: &str, depth: usize) -> anyhow::Result<()> {
    let config = arbor_db::DbConfig {
        depth,
        ..arbor_db::DbConfig::default()
    };
    let db = Database::create_with(dir, config)?;
    println!(
        "{} Initialized database in {}",
        "✓".green().bold(),
        dir.bold()
    );
    println!(
        "  Depth: {}  Chunker polynomial: {}",
        depth,
        db.config().chunker_polynomial.to_string().cyan()
    );
    Ok(())
}

fn cmd_put_block(db: &Database, algorithm: Algorithm, args: PutBlockArgs) -> anyhow::Result<()> {
    let data = read_input(&args.file)?;
    let block = db.put_block(algorithm, &data)?;
    println!("{}", block.path().canonical().yellow());
    Ok(())
}

fn cmd_cat(db: &Database, args: CatArgs) -> anyhow::Result<()> {
    let path = resolve(db, &args.address)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &path {
        ObjectPath::Block(_) => out.write_all(&db.get_block(&path)?)?,
        ObjectPath::Tree(_) => {
            let mut tree = db.get_tree(&path, true)?;
            io::copy(&mut tree, &mut out)?;
        }
        ObjectPath::Stream(label) => {
            let mut stream = db.open_stream(label)?;
            io::copy(&mut stream, &mut out)?;
        }
    }
    Ok(())
}

fn cmd_put(db: &Database, algorithm: Algorithm, args: PutArgs) -> anyhow::Result<()> {
    let tree = db.put_stream(algorithm, open_input(&args.file)?)?;
    db.link_stream(&tree, &args.stream)?;
    println!(
        "{} {} {} {}",
        "✓".green().bold(),
        args.stream.bold(),
        "→".dimmed(),
        tree.path().canonical().yellow()
    );
    Ok(())
}

fn cmd_append(db: &Database, args: AppendArgs) -> anyhow::Result<()> {
    let data = read_input(&args.file)?;
    let stream = db.append_stream(&args.stream, &data)?;
    println!(
        "{} {} {} {}",
        "✓".green().bold(),
        args.stream.bold(),
        "→".dimmed(),
        stream.tree().path().canonical().yellow()
    );
    Ok(())
}

fn cmd_ls(db: &Database, args: LsArgs) -> anyhow::Result<()> {
    let path = resolve(db, &args.address)?;
    for entry in db.ls(&path, args.all)? {
        println!("{}", entry.canonical());
    }
    Ok(())
}

fn cmd_verify(db: &Database, args: VerifyArgs) -> anyhow::Result<()> {
    let path = resolve(db, &args.address)?;
    db.verify(&path)?;
    println!("{} {} verified", "✓".green().bold(), path.canonical());
    Ok(())
}

fn cmd_rm(db: &Database, args: RmArgs) -> anyhow::Result<()> {
    let path = resolve(db, &args.address)?;
    db.rm(&path)?;
    println!("removed {}", path.canonical());
    Ok(())
}

fn cmd_stat(db: &Database, args: StatArgs) -> anyhow::Result<()> {
    let path = resolve(db, &args.address)?;
    let size = db.size(&path)?;
    println!("{}", path.canonical().yellow());
    println!("  Class: {}", path.class().to_string().cyan());
    println!("  Size: {size} bytes");
    if let ObjectPath::Stream(label) = &path {
        let stream = db.open_stream(label)?;
        println!("  Root: {}", stream.tree().path().canonical());
    }
    Ok(())
}
