// ============================================================================
// signify CLI: headless composition and page signing
// ============================================================================
//
// Usage examples:
//   signify compose scan.png --text "Approved" --text-at 50,50 --signature sig.png
//   signify compose scan.png --signature sig.png --signature-at 420,610 --remote
//   signify sign-pdf contract.pdf --signature sig.png --place 1:100,900 --place 3:100,900
//
// Everything runs on the current thread except the remote conversion, which
// gets a single-threaded tokio runtime.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use crate::config::EditorConfig;
use crate::domain::Point;
use crate::editor::Editor;
use crate::export;
use crate::loader::{self, SignatureInput, SignatureSlot, SourceData};
use crate::session::{PageSigner, StampSize};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Place text and signatures on documents and export a signed PDF.
#[derive(Parser, Debug)]
#[command(name = "signify", version, about)]
pub struct CliArgs {
    /// Read settings from this JSON file instead of the user config
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Compose text and a signature over an image and export one PDF page
    Compose(ComposeArgs),
    /// Stamp a signature onto pages of a PDF (needs the `pdf` feature)
    SignPdf(SignPdfArgs),
}

#[derive(clap::Args, Debug)]
pub struct ComposeArgs {
    /// Background image
    pub document: PathBuf,

    /// Text to place on the document
    #[arg(long)]
    pub text: Option<String>,

    /// Text top-left in document pixels
    #[arg(long, value_name = "X,Y", value_parser = parse_point, requires = "text")]
    pub text_at: Option<Point>,

    /// Text scale relative to the base font size
    #[arg(long, value_name = "SCALE", requires = "text")]
    pub text_scale: Option<f32>,

    /// Signature image file, or a `data:image/png;base64,...` URL
    #[arg(long, value_name = "FILE|DATA_URL")]
    pub signature: Option<String>,

    /// Signature top-left in document pixels
    #[arg(long, value_name = "X,Y", value_parser = parse_point)]
    pub signature_at: Option<Point>,

    /// Signature scale relative to its pixel size
    #[arg(long, value_name = "SCALE")]
    pub signature_scale: Option<f32>,

    /// Output PDF; defaults to the configured file name in the documents dir
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Convert through the remote service instead of building the PDF locally
    #[arg(long)]
    pub remote: bool,

    /// Remote service base URL; overrides the configured one
    #[arg(long, value_name = "URL", requires = "remote")]
    pub backend_url: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SignPdfArgs {
    /// PDF to sign
    pub pdf: PathBuf,

    /// Signature image file, or a `data:image/png;base64,...` URL
    #[arg(long, value_name = "FILE|DATA_URL")]
    pub signature: String,

    /// Stamp position as PAGE:X,Y (1-based page, page pixels); repeatable
    #[arg(long = "place", value_name = "PAGE:X,Y", value_parser = parse_placement)]
    pub placements: Vec<(usize, Point)>,

    /// Treat X,Y as clicks on pages displayed this many pixels wide
    #[arg(long, value_name = "PIXELS")]
    pub display_width: Option<f32>,

    /// Output PDF; defaults to the configured file name in the documents dir
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad X '{x}': {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad Y '{y}': {e}"))?;
    let point = Point::new(x, y);
    if !point.is_finite() {
        return Err(format!("coordinates must be finite, got '{s}'"));
    }
    Ok(point)
}

fn parse_placement(s: &str) -> Result<(usize, Point), String> {
    let (page, point) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PAGE:X,Y, got '{s}'"))?;
    let page: usize = page
        .trim()
        .parse()
        .map_err(|e| format!("bad page '{page}': {e}"))?;
    if page == 0 {
        return Err("pages are numbered from 1".to_string());
    }
    Ok((page - 1, parse_point(point)?))
}

fn signature_input(arg: &str) -> SignatureInput {
    if arg.starts_with("data:") {
        SignatureInput::DataUrl(arg.to_string())
    } else {
        SignatureInput::Data(SourceData::Path(PathBuf::from(arg)))
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the selected command and return an OS exit code
pub fn run(args: CliArgs) -> ExitCode {
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        CliCommand::Compose(compose_args) => compose(config, compose_args),
        CliCommand::SignPdf(sign_args) => sign_pdf(config, sign_args),
    };

    match result {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Export failed: {:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EditorConfig> {
    match path {
        Some(path) => EditorConfig::load_from(path),
        None => Ok(EditorConfig::load()),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn compose(config: EditorConfig, args: ComposeArgs) -> anyhow::Result<PathBuf> {
    let out = args.out.unwrap_or_else(|| config.default_output_path());
    let backend_url = args
        .backend_url
        .unwrap_or_else(|| config.backend_url.clone());
    let mut editor = Editor::new(config).context("starting editor")?;

    editor
        .open_document(SourceData::Path(args.document.clone()))
        .with_context(|| format!("opening {}", args.document.display()))?;

    if let Some(text) = args.text {
        let state = editor.state_mut();
        state.set_text(text);
        if let Some(at) = args.text_at {
            state.move_text(at);
        }
        if let Some(scale) = args.text_scale {
            state.scale_text(scale);
        }
    }

    if let Some(signature) = &args.signature {
        editor
            .load_signature(SignatureSlot::Uploaded, signature_input(signature))
            .context("loading signature")?;
        let state = editor.state_mut();
        if let Some(at) = args.signature_at {
            state.move_signature(at);
        }
        if let Some(scale) = args.signature_scale {
            state.scale_signature(scale);
        }
    }

    let pdf = if args.remote {
        let png = editor.export_png().context("flattening")?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("starting async runtime")?;
        let client = reqwest::Client::new();
        runtime
            .block_on(export::remote::convert(&client, &backend_url, png))
            .context("remote conversion")?
    } else {
        editor.export_pdf().context("building PDF")?
    };

    export::save_atomically(&out, &pdf)?;
    Ok(out)
}

fn sign_pdf(config: EditorConfig, args: SignPdfArgs) -> anyhow::Result<PathBuf> {
    let out = args.out.clone().unwrap_or_else(|| config.default_output_path());

    let document = loader::load_document(SourceData::Path(args.pdf.clone()), config.pdf_render_scale)
        .with_context(|| format!("opening {}", args.pdf.display()))?;
    let Some(mut signer) = PageSigner::from_document(document, StampSize::from(&config)) else {
        bail!("{} has no pages", args.pdf.display());
    };

    let signature = loader::load_signature(signature_input(&args.signature))
        .context("loading signature")?;
    signer.set_signature(Some(signature));

    for (page, at) in &args.placements {
        let at = match args.display_width {
            Some(width) => signer
                .display_to_page(*page, *at, width)
                .with_context(|| format!("cannot map click on page {}", page + 1))?,
            None => *at,
        };
        if !signer.place_signature(*page, at) {
            bail!(
                "page {} does not exist ({} pages)",
                page + 1,
                signer.page_count()
            );
        }
    }

    let pdf = export::export_signed_pages(&signer).context("building signed PDF")?;
    export::save_atomically(&out, &pdf)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("50,60.5"), Ok(Point::new(50.0, 60.5)));
        assert_eq!(parse_point(" -3 , 4 "), Ok(Point::new(-3.0, 4.0)));
        assert!(parse_point("50").is_err());
        assert!(parse_point("a,b").is_err());
        assert!(parse_point("inf,1").is_err());
    }

    #[test]
    fn test_parse_placement_is_one_based() {
        assert_eq!(parse_placement("1:10,20"), Ok((0, Point::new(10.0, 20.0))));
        assert_eq!(parse_placement("3:0,0"), Ok((2, Point::ORIGIN)));
        assert!(parse_placement("0:1,1").is_err());
        assert!(parse_placement("10,20").is_err());
    }

    #[test]
    fn test_cli_parses_compose() {
        let args = CliArgs::try_parse_from([
            "signify",
            "compose",
            "scan.png",
            "--text",
            "Hello",
            "--text-at",
            "50,50",
            "--remote",
            "--backend-url",
            "http://example.test",
        ])
        .unwrap();
        let CliCommand::Compose(compose) = args.command else {
            panic!("expected compose");
        };
        assert_eq!(compose.text.as_deref(), Some("Hello"));
        assert_eq!(compose.text_at, Some(Point::new(50.0, 50.0)));
        assert!(compose.remote);
    }

    #[test]
    fn test_backend_url_requires_remote() {
        assert!(CliArgs::try_parse_from([
            "signify",
            "compose",
            "scan.png",
            "--backend-url",
            "http://example.test",
        ])
        .is_err());
    }

    #[test]
    fn test_text_placement_requires_text() {
        for flag in [["--text-at", "50,50"], ["--text-scale", "2"]] {
            let mut argv = vec!["signify", "compose", "scan.png"];
            argv.extend(flag);
            assert!(CliArgs::try_parse_from(argv.clone()).is_err(), "{flag:?} without --text");
            argv.extend(["--text", "Hello"]);
            assert!(CliArgs::try_parse_from(argv.clone()).is_ok(), "{flag:?} with --text");
        }
    }

    #[test]
    fn test_signature_argument_kinds() {
        assert!(matches!(
            signature_input("data:image/png;base64,AAAA"),
            SignatureInput::DataUrl(_)
        ));
        assert!(matches!(
            signature_input("sig.png"),
            SignatureInput::Data(SourceData::Path(_))
        ));
    }

    #[test]
    fn test_compose_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let bg = dir.path().join("bg.png");
        let img = image::RgbaImage::from_pixel(120, 90, image::Rgba([255, 255, 255, 255]));
        img.save(&bg).unwrap();
        let out = dir.path().join("signed.pdf");

        let args = ComposeArgs {
            document: bg,
            text: Some("Hi".to_string()),
            text_at: Some(Point::new(5.0, 5.0)),
            text_scale: None,
            signature: None,
            signature_at: None,
            signature_scale: None,
            out: Some(out.clone()),
            remote: false,
            backend_url: None,
        };
        let written = compose(EditorConfig::default(), args).unwrap();
        assert_eq!(written, out);
        let pdf = lopdf::Document::load(&out).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);
    }
}
