//! Parsing of shell input lines into engine commands.

use anyhow::{anyhow, bail, Context, Result};
use codec::{Key, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put(Key, Value),
    Del(Key),
    Get(Key),
    /// Flush to an explicit path, or to an auto-named file in the SST dir.
    Flush(Option<PathBuf>),
    Sync,
    Stats,
    Exit,
}

pub const USAGE: &str = "Commands: PUT zone type x y value | DEL zone type x y | GET zone type x y\n          FLUSH [path] | SYNC | STATS | EXIT";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let cmd = match parts.next() {
        Some(c) => c.to_uppercase(),
        None => return Ok(None),
    };
    let args: Vec<&str> = parts.collect();

    let command = match cmd.as_str() {
        "PUT" => {
            if args.len() != 5 {
                bail!("usage: PUT zone type x y value");
            }
            let value: u64 = args[4]
                .parse()
                .with_context(|| format!("invalid value: {}", args[4]))?;
            Command::Put(parse_key(&args[..4])?, Value(value))
        }
        "DEL" => {
            if args.len() != 4 {
                bail!("usage: DEL zone type x y");
            }
            Command::Del(parse_key(&args)?)
        }
        "GET" => {
            if args.len() != 4 {
                bail!("usage: GET zone type x y");
            }
            Command::Get(parse_key(&args)?)
        }
        "FLUSH" => match args.as_slice() {
            [] => Command::Flush(None),
            [path] => Command::Flush(Some(PathBuf::from(path))),
            _ => bail!("usage: FLUSH [path]"),
        },
        "SYNC" => Command::Sync,
        "STATS" => Command::Stats,
        "EXIT" | "QUIT" => Command::Exit,
        other => return Err(anyhow!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

fn parse_key(fields: &[&str]) -> Result<Key> {
    let mut nums = [0u16; 4];
    for (slot, (field, name)) in nums
        .iter_mut()
        .zip(fields.iter().zip(["zone", "type", "x", "y"]))
    {
        *slot = field
            .parse()
            .with_context(|| format!("invalid {}: {}", name, field))?;
    }
    Ok(Key::new(nums[0], nums[1], nums[2], nums[3]))
}
