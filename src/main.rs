extern crate serde;
extern crate serde_json;

use anyhow::Result;

#[macro_use]
extern crate serde_derive;

mod action;
mod cli;
mod config;
mod follow;
mod host;
mod router;
mod source;

fn main() -> Result<()> {
    cli::main()
}
