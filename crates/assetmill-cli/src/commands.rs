use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use assetmill_pipeline::{PipelineConfig, SourceFile};
use assetmill_server::{AssetMiddleware, AssetServer, Method, Resolution, ServerConfig};
use assetmill_walk::path::absolute;
use assetmill_walk::SubpathWalker;
use colored::Colorize;
use serde_json::json;
use tracing::{debug, info};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Build(args) => cmd_build(config, args, &cli.format).await,
        Command::Sources(args) => cmd_sources(config, args, &cli.format).await,
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            ServerConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(ServerConfig::default()),
    }
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!(
        "assetmill on {} (sources: {}, output: {})",
        config.bind_addr.to_string().bold(),
        join_paths(&config.assets.source),
        config.assets.output_root.display()
    );
    AssetServer::new(config)?.serve().await?;
    Ok(())
}

async fn cmd_build(
    mut config: ServerConfig,
    args: BuildArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if let Some(force) = args.force {
        config.assets.force = force;
    }
    info!(path = %args.path, force = %config.assets.force, "building");
    let assets = AssetMiddleware::from_config(config.assets)?;

    let started = Instant::now();
    let resolution = assets.handle(&Method::GET, &args.path).await;
    let elapsed_ms = started.elapsed().as_millis();
    info!(path = %args.path, elapsed_ms, "build finished");

    match format {
        OutputFormat::Json => {
            let value = match &resolution {
                Resolution::Serve(path) => {
                    json!({ "status": "ready", "artifact": path, "elapsed_ms": elapsed_ms })
                }
                Resolution::PassThrough => {
                    json!({ "status": "pass-through", "elapsed_ms": elapsed_ms })
                }
                Resolution::Failed(err) => {
                    json!({ "status": "failed", "error": err.to_string() })
                }
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => match &resolution {
            Resolution::Serve(path) => println!(
                "{} {} ({elapsed_ms} ms)",
                "✓".green().bold(),
                path.display().to_string().bold()
            ),
            Resolution::PassThrough => println!(
                "{} {} is not an artifact or nothing qualified",
                "-".yellow(),
                args.path
            ),
            Resolution::Failed(err) => println!("{} {}", "✗".red().bold(), err),
        },
    }

    if let Resolution::Failed(err) = resolution {
        anyhow::bail!("build of {} failed: {err}", args.path);
    }
    Ok(())
}

async fn cmd_sources(
    config: ServerConfig,
    args: SourcesArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let roots = if args.paths.is_empty() {
        config.assets.source
    } else {
        args.paths
    };
    let roots = roots
        .iter()
        .map(|p| absolute(p).with_context(|| format!("resolving {}", p.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;
    debug!(roots = roots.len(), "walking sources");

    let mut pipeline = PipelineConfig::new();
    match (args.extensions.is_empty(), config.assets.extensions) {
        (false, _) => pipeline = pipeline.extensions(args.extensions),
        (true, Some(extensions)) => pipeline = pipeline.extensions(extensions),
        (true, None) => {}
    }
    let pipeline = pipeline.build();

    let mut walker = SubpathWalker::new(roots);
    let mut files = Vec::new();
    while let Some(entry) = walker.next().await? {
        let file = SourceFile::from(entry);
        if pipeline.prefilter_accepts(&file).await? {
            files.push(file.path);
        }
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "files": files }))?)
        }
        OutputFormat::Text => {
            for path in &files {
                println!("  {}", path.display());
            }
            println!("{} file(s)", files.len().to_string().bold());
        }
    }
    Ok(())
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> ServerConfig {
        let src = dir.join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("a.js"), "1;").unwrap();
        std::fs::write(src.join("b.css"), "x").unwrap();
        let mut config = ServerConfig::default();
        config.assets.source = vec![src];
        config.assets.output_root = dir.join("out");
        config
    }

    #[tokio::test]
    async fn build_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.assets.extensions = Some(vec!["js".into()]);
        let args = BuildArgs { path: "/app.js".into(), force: None };
        cmd_build(config, args, &OutputFormat::Json).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("out/app.js")).unwrap(), "1;");
    }

    #[tokio::test]
    async fn build_outside_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let args = BuildArgs { path: "/../escape.js".into(), force: None };
        assert!(cmd_build(config, args, &OutputFormat::Text).await.is_err());
    }

    #[tokio::test]
    async fn sources_lists_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let args = SourcesArgs { paths: vec![], extensions: vec!["css".into()] };
        cmd_sources(config, args, &OutputFormat::Text).await.unwrap();
    }

    #[test]
    fn missing_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
