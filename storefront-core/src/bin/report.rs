use dotenv::dotenv;
use storefront_core::config::Config;
use storefront_core::db;
use storefront_core::reports::{Report, ReportEngine};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "usage: report <1-20> [YYYY-MM]\n       report list";

/// Runs one canned report against the store and prints it as JSON.
///
/// Logs go to stderr so stdout stays machine-readable.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(LevelFilter::WARN.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut args = std::env::args().skip(1);
    let selector = args.next().ok_or_else(|| anyhow::anyhow!(USAGE))?;

    if selector == "list" {
        for report in Report::ALL {
            println!("{}", report);
        }
        return Ok(());
    }

    let report: Report = selector
        .parse()
        .map_err(|e| anyhow::anyhow!("{}\n{}", e, USAGE))?;
    let param = args.next();

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::init_schema(&pool).await?;

    info!("Running report {}", report);
    let table = ReportEngine::new(pool).run(report, param.as_deref()).await?;

    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
