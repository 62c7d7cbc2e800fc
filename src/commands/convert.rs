use clap;
use std::fs::File;
use std::io::{BufReader,BufWriter,Cursor,Read,Write};
use log::{info,warn,error};
use crate::img;
use crate::img::wdi::WdiWriter;
use super::CommandError;
use crate::STDRESULT;

/// Open the dump, returning a reader and the dump size.
/// Stdin is read to the end so that its size can be checked.
fn open_input(maybe_path: Option<&String>) -> Result<(Box<dyn Read>,u64),Box<dyn std::error::Error>> {
    match maybe_path {
        Some(path) => {
            let file = File::open(path)?;
            let size = file.metadata()?.len();
            Ok((Box::new(BufReader::new(file)),size))
        },
        None => {
            if atty::is(atty::Stream::Stdin) {
                error!("line entry is not supported for `convert`, please pipe something in");
                return Err(Box::new(CommandError::InvalidCommand));
            }
            let mut dump = Vec::new();
            std::io::stdin().read_to_end(&mut dump)?;
            let size = dump.len() as u64;
            Ok((Box::new(Cursor::new(dump)),size))
        }
    }
}

fn open_output(maybe_path: Option<&String>) -> Result<Box<dyn Write>,Box<dyn std::error::Error>> {
    match maybe_path {
        Some(path) => {
            if !img::wdi::file_extensions().iter().any(|ext| path.to_lowercase().ends_with(&format!(".{}",ext))) {
                warn!("output {} does not have a wdi extension",path);
            }
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        },
        None => {
            if atty::is(atty::Stream::Stdout) {
                error!("pipe or redirect the output, or use --output");
                return Err(Box::new(CommandError::TerminalOutput));
            }
            Ok(Box::new(BufWriter::new(std::io::stdout())))
        }
    }
}

pub fn convert(cmd: &clap::ArgMatches) -> STDRESULT {
    let geometry = super::get_geometry(cmd)?;
    let (input,size) = open_input(cmd.get_one::<String>("input"))?;
    match geometry.check_image_size(size) {
        Ok(()) => {},
        Err(img::Error::ImageSizeMismatch { .. }) if cmd.get_flag("force") => {
            warn!("converting anyway, incomplete tracks at the end are dropped");
        },
        Err(img::Error::ImageSizeMismatch { .. }) => {
            error!("{}",CommandError::SizeMismatch);
            return Err(Box::new(CommandError::SizeMismatch));
        },
        Err(e) => return Err(Box::new(e))
    }
    let heads = geometry.heads();
    let mut writer = WdiWriter::new(open_output(cmd.get_one::<String>("output"))?,geometry);
    let summary = writer.convert(input,|progress| {
        if progress.head + 1 == heads {
            info!("cylinder {} done",progress.cylinder);
        }
        true
    })?;
    eprintln!("{} cylinder(s) written.",summary.cylinders);
    Ok(())
}
