use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::Read;
use std::{env, fs, process};
use trans_overlay_config::Config;
use trans_overlay_engine::{
    AnnotationSet, OverlayPlan, PostLayout, RichTextRenderer, parse_with_default_template, plan,
};

const DEFAULT_LAYOUT_POSTS: usize = 1;

/// Where the post layout comes from.
#[derive(Debug, PartialEq, Eq)]
enum LayoutSource {
    /// A plain thread of this many single-slot posts.
    Thread(usize),
    /// A JSON-encoded [`PostLayout`].
    File(String),
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    template: Option<String>,
    layout: LayoutSource,
    input: String,
}

#[derive(Serialize)]
struct Output<'a> {
    annotations: &'a AnnotationSet,
    plan: &'a OverlayPlan,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut template = None;
    let mut layout = LayoutSource::Thread(DEFAULT_LAYOUT_POSTS);
    let mut input = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--template" => {
                let value = iter.next().context("--template needs a value")?;
                template = Some(value.clone());
            }
            "--layout" => {
                let value = iter.next().context("--layout needs a value")?;
                let posts = value
                    .parse()
                    .with_context(|| format!("invalid post count `{value}`"))?;
                layout = LayoutSource::Thread(posts);
            }
            "--layout-file" => {
                let value = iter.next().context("--layout-file needs a value")?;
                layout = LayoutSource::File(value.clone());
            }
            other if input.is_none() => input = Some(other.to_string()),
            other => bail!("unexpected argument `{other}`"),
        }
    }

    let input = input.context("missing input file (use `-` for stdin)")?;
    Ok(Args {
        template,
        layout,
        input,
    })
}

fn load_layout(source: &LayoutSource) -> Result<PostLayout> {
    match source {
        LayoutSource::Thread(posts) => Ok(PostLayout::thread(*posts)),
        LayoutSource::File(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("invalid layout in {path}"))
        }
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
}

fn load_config() -> Config {
    match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::info!(
                "No config file at {}, using defaults",
                Config::config_path().display()
            );
            Config::default()
        }
        Err(e) => {
            log::warn!("Failed to load config file, using defaults: {e}");
            Config::default()
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config();
    let default_template = config.resolve_default_template().unwrap_or_else(|e| {
        log::warn!("{e}");
        config.default_template.clone()
    });

    let layout = load_layout(&args.layout)?;
    let raw = read_input(&args.input)?;
    let set = parse_with_default_template(&raw, args.template.as_deref(), &default_template);
    log::info!("Parsed {} level(s)", set.levels.len());

    let renderer = RichTextRenderer::new(config.render_options());
    let plan = plan(&set, &layout, &renderer);

    let output = Output {
        annotations: &set,
        plan: &plan,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = env::args().collect();
    let program = argv.first().map_or("trans-overlay", String::as_str);
    let args = match parse_args(argv.get(1..).unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!(
                "Usage: {program} [--template <html>] [--layout <n-posts> | --layout-file <json>] <file|->"
            );
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_flags() {
        let parsed = parse_args(&args(&["--template", "<p>t</p>", "--layout", "3", "in.txt"])).unwrap();
        assert_eq!(
            parsed,
            Args {
                template: Some("<p>t</p>".to_string()),
                layout: LayoutSource::Thread(3),
                input: "in.txt".to_string(),
            }
        );
    }

    #[test]
    fn stdin_marker_is_an_input() {
        let parsed = parse_args(&args(&["-"])).unwrap();
        assert_eq!(parsed.input, "-");
        assert_eq!(parsed.layout, LayoutSource::Thread(DEFAULT_LAYOUT_POSTS));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["--layout", "many", "x"])).is_err());
        assert!(parse_args(&args(&["a", "b"])).is_err());
        assert!(parse_args(&args(&["--template"])).is_err());
        assert!(parse_args(&args(&["x", "--layout-file"])).is_err());
    }

    #[test]
    fn last_layout_flag_wins() {
        let parsed = parse_args(&args(&["--layout", "2", "--layout-file", "l.json", "-"])).unwrap();
        assert_eq!(parsed.layout, LayoutSource::File("l.json".to_string()));
    }

    #[test]
    fn layout_file_is_read_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(
            &path,
            r#"{"posts": [
                {"text_slots": 1, "image_slots": 0, "vote_slots": 0},
                {"text_slots": 2, "image_slots": 1, "vote_slots": 0, "is_primary": true}
            ]}"#,
        )
        .unwrap();

        let source = LayoutSource::File(path.display().to_string());
        let layout = load_layout(&source).unwrap();
        assert_eq!(layout.posts.len(), 2);
        assert_eq!(layout.primary_position(), Some(2));
        assert_eq!(layout.posts[1].image_slots, 1);
    }

    #[test]
    fn malformed_layout_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(load_layout(&LayoutSource::File(path.display().to_string())).is_err());
    }
}
