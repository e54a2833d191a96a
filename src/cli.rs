use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg};
use log::debug;

use crate::action::Action;
use crate::config::Config;
use crate::follow::FollowStore;
use crate::host::TerminalHost;
use crate::router::Router;
use crate::source::invidious::InvidiousClient;

fn config_logging(verbosity: u64) -> Result<()> {
    // Level for this application
    let internal_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,  // -v
        2 => log::LevelFilter::Debug, // -vv
        _ => log::LevelFilter::Trace, // -vvv
    };

    // Show log output for 3rd party library at -vvv
    let thirdparty_level = match verbosity {
        0..=2 => log::LevelFilter::Warn,
        _ => log::LevelFilter::Debug,
    };

    // stdout carries the rendered directory, so logs go to stderr
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(thirdparty_level)
        .level_for("invidious_plugin", internal_level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

pub fn main() -> Result<()> {
    let app = App::new("invidious-plugin")
        .about("Browse and play videos from an Invidious instance")
        // Hosts pass -1 as the handle for context menu invocations
        .setting(AppSettings::AllowNegativeNumbers)
        .arg(
            Arg::with_name("plugin_url")
                .required(true)
                .help("Base callback URL of the plugin"),
        )
        .arg(
            Arg::with_name("handle")
                .required(true)
                .help("Numeric handle assigned by the host"),
        )
        .arg(
            Arg::with_name("query")
                .default_value("")
                .help("Query string, e.g ?action=show_channel&channel_id=UC..."),
        )
        .arg(
            // Newer hosts append e.g `resume:false`; ignored
            Arg::with_name("host_args").multiple(true).hidden(true),
        )
        .arg(
            Arg::with_name("instance")
                .long("instance")
                .takes_value(true)
                .value_name("URL")
                .help("Invidious instance to query"),
        )
        .arg(
            Arg::with_name("adaptive")
                .long("adaptive")
                .help("Report MPEG-DASH playback as available"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .takes_value(false)
                .global(true),
        );

    // Parse
    let app_m = app.get_matches();

    // Logging levels
    let verbosity = app_m.occurrences_of("verbose");
    config_logging(verbosity)?;

    let plugin_url = app_m
        .value_of("plugin_url")
        .expect("required arg plugin_url missing");
    let handle: i32 = app_m
        .value_of("handle")
        .expect("required arg handle missing")
        .parse()
        .context("Plugin handle must be an integer")?;
    let query = app_m.value_of("query").unwrap_or("");

    let mut cfg = Config::load()?;
    if let Some(instance) = app_m.value_of("instance") {
        cfg.instance_url = instance.into();
    }

    debug!("--------------------------------------------");
    debug!("base url: {}", plugin_url);
    debug!("handle: {}", handle);
    debug!("query: {}", query);
    debug!("data dir: {:?}", cfg.data_dir());
    debug!("--------------------------------------------");

    let action = Action::from_query(query)?;

    let client = InvidiousClient::new(&cfg.instance_url, cfg.request_timeout);
    let store = FollowStore::new(cfg.following_path());
    debug!("Using instance {} and follow list {:?}", client.base_url(), store.path());

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut host = TerminalHost::new(stdin.lock(), stdout.lock(), app_m.is_present("adaptive"));

    Router::new(plugin_url, &client, &store, &mut host).run(action)
}
