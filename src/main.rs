use anyhow::Result;
use clap::Parser;

mod cli;
mod enrich;
mod error;
mod ext;
mod fetch;
mod model;
mod normalize;
mod params;
mod render;
mod runner;
mod sources;
mod timeline;
mod util;
mod window;

use crate::cli::{init_tracing, normalize, Cli};
use crate::sources::github::get_github_token;

fn main() -> Result<()> {
  // A .env in the working directory fills unset variables before clap reads them
  dotenvy::dotenv().ok();

  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_tracing(cli.verbose);

  // Phase 1: validate everything before any network call
  let cfg = normalize(cli, get_github_token())?;

  // Phase 2: fetch, filter, propagate, enrich, render
  runner::run_report(&cfg)
}
