//! Command handlers behind the `kartvid` binary.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::core::masks::MaskLoader;
use crate::core::raster::{codec, PixelCompare};
use crate::race::{
    FileFrames, Fidelity, PipelineConfig, ScreenBuilder, TemplateClassifier, VideoProcessor,
};

use super::cli::{Cli, Command};
use super::error::KvError;

/// Runs the selected command, writing its normal output to `out`.
pub fn execute<W: Write>(cli: &Cli, out: &mut W) -> Result<(), KvError> {
    let config = resolve_config(cli)?;

    match &cli.command {
        Command::And {
            input1,
            input2,
            output,
        } => cmd_and(&config, input1, input2, output),
        Command::Compare { image, mask } => cmd_compare(&config, image, mask, out),
        Command::Translatexy {
            input,
            output,
            dx,
            dy,
        } => cmd_translatexy(&config, input, output, *dx, *dy),
        Command::Ident { image } => cmd_ident(cli, config, image, out),
        Command::Video { frames } => cmd_video(cli, config, frames, out),
    }
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig, KvError> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(rate) = cli.frame_rate {
        config.race.frame_rate = rate;
    }
    if cli.parallel {
        config.parallel = true;
    }

    config
        .validate()
        .map_err(|e| KvError::Usage(e.to_string()))?;
    Ok(config)
}

fn mask_dir(cli: &Cli) -> Result<PathBuf, KvError> {
    if let Some(dir) = &cli.masks {
        return Ok(dir.clone());
    }

    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| KvError::Usage("cannot locate mask directory; pass --masks".into()))?;
    Ok(dir.join("assets").join("masks"))
}

fn screen_builder(cli: &Cli, config: &PipelineConfig) -> Result<ScreenBuilder, KvError> {
    let masks = MaskLoader::new(mask_dir(cli)?).load()?;
    let classifier = TemplateClassifier::new(
        masks,
        PixelCompare::with_config(config.compare.clone()),
        config.classifier.clone(),
    );
    Ok(ScreenBuilder::new(classifier))
}

fn cmd_and(config: &PipelineConfig, input1: &Path, input2: &Path, output: &Path) -> Result<(), KvError> {
    let compare = PixelCompare::with_config(config.compare.clone());
    let mut image = codec::decode(input1)?;
    let mask = codec::decode(input2)?;

    compare.mask_and(&mut image, &mask)?;
    codec::encode(&image, output)?;
    Ok(())
}

fn cmd_compare<W: Write>(
    config: &PipelineConfig,
    image: &Path,
    mask: &Path,
    out: &mut W,
) -> Result<(), KvError> {
    let compare = PixelCompare::with_config(config.compare.clone());
    let image = codec::decode(image)?;
    let mask = codec::decode(mask)?;

    let score = compare.compare(&image, &mask)?;
    writeln!(out, "{score:.6}")?;
    Ok(())
}

fn cmd_translatexy(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    dx: i64,
    dy: i64,
) -> Result<(), KvError> {
    let compare = PixelCompare::with_config(config.compare.clone());
    let image = codec::decode(input)?;

    codec::encode(&compare.translate(&image, dx, dy), output)?;
    Ok(())
}

fn cmd_ident<W: Write>(
    cli: &Cli,
    config: PipelineConfig,
    image: &Path,
    out: &mut W,
) -> Result<(), KvError> {
    let builder = screen_builder(cli, &config)?;
    let frame = codec::decode(image)?;

    let screen = builder.build(&frame, Fidelity::Exhaustive);
    writeln!(out, "{screen}")?;
    Ok(())
}

fn cmd_video<W: Write>(
    cli: &Cli,
    config: PipelineConfig,
    frames: &[PathBuf],
    out: &mut W,
) -> Result<(), KvError> {
    let builder = screen_builder(cli, &config)?;
    let source = FileFrames::new(frames.to_vec());
    let mut processor = VideoProcessor::new(&builder, config);

    let mut write_error = None;
    let stats = processor.run(&source, |event| {
        if write_error.is_none() {
            if let Err(e) = writeln!(out, "{event}") {
                write_error = Some(e);
            }
        }
    });

    if let Some(e) = write_error {
        return Err(e.into());
    }
    info!("video done: {} events from {} frames", stats.events, stats.frames);
    Ok(())
}
