use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Gzip `path` into `path.gz` and remove the original.
///
/// The original is only removed once the archive is fully written. A failed
/// write removes the partial archive and leaves the original in place.
pub fn gzip_replace(path: &Path) -> io::Result<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    let gz_path = PathBuf::from(name);

    let mut input = BufReader::new(File::open(path)?);
    let output = BufWriter::new(File::create(&gz_path)?);
    if let Err(e) = encode(&mut input, output) {
        let _ = fs::remove_file(&gz_path);
        return Err(e);
    }

    fs::remove_file(path)?;
    Ok(gz_path)
}

fn encode(input: &mut impl Read, output: impl Write) -> io::Result<()> {
    let mut encoder = GzEncoder::new(output, Compression::best());
    io::copy(input, &mut encoder)?;
    encoder.finish()?.flush()
}
