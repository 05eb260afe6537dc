use crate::bio::sequence::Sequence;
use crate::MicronotaError;
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, not_line_ending},
    combinator::{map, opt},
    sequence::preceded,
    IResult,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Parse a FASTA header line
fn parse_header(input: &[u8]) -> IResult<&[u8], (&str, Option<&str>)> {
    let (input, _) = tag(b">")(input)?;
    let (input, id) = map(
        take_till(|c: u8| c == b' ' || c == b'\t' || c == b'\n' || c == b'\r'),
        |s| std::str::from_utf8(s).unwrap_or(""),
    )(input)?;
    let (input, description) = opt(preceded(
        tag(b" "),
        map(not_line_ending, |s| std::str::from_utf8(s).unwrap_or("")),
    ))(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, (id, description)))
}

/// Parse sequence lines until next header or EOF
fn parse_sequence(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut sequence = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;

        for &c in line {
            if !c.is_ascii_whitespace() {
                sequence.push(c.to_ascii_uppercase());
            }
        }

        remaining = rest;
    }

    Ok((remaining, sequence))
}

/// Parse a single FASTA record
fn parse_record(input: &[u8]) -> IResult<&[u8], Sequence> {
    let (input, (id, description)) = parse_header(input)?;
    let (input, sequence) = parse_sequence(input)?;

    let mut seq = Sequence::new(id.to_string(), sequence);
    if let Some(desc) = description {
        seq = seq.with_description(desc.to_string());
    }

    Ok((input, seq))
}

/// Parse a FASTA file into sequences (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Sequence>, MicronotaError> {
    let path = path.as_ref();

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        parse_fasta_gzip(path)
    } else {
        parse_fasta_uncompressed(path)
    }
}

fn parse_fasta_uncompressed(path: &Path) -> Result<Vec<Sequence>, MicronotaError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };

    parse_fasta_buffer(&mmap[..])
}

fn parse_fasta_gzip(path: &Path) -> Result<Vec<Sequence>, MicronotaError> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut buffer = Vec::new();
    decoder.read_to_end(&mut buffer)?;

    parse_fasta_buffer(&buffer)
}

/// Parse FASTA from a byte buffer
pub fn parse_fasta_buffer(buffer: &[u8]) -> Result<Vec<Sequence>, MicronotaError> {
    let mut input = buffer;
    let mut sequences = Vec::new();

    while !input.is_empty() {
        // Skip blank lines between records
        while !input.is_empty() && input[0].is_ascii_whitespace() {
            input = &input[1..];
        }

        if input.is_empty() {
            break;
        }

        match parse_record(input) {
            Ok((remaining, seq)) => {
                if !seq.is_empty() {
                    sequences.push(seq);
                }
                input = remaining;
            }
            Err(e) => {
                return Err(MicronotaError::Parse(format!(
                    "Failed to parse FASTA: {:?}",
                    e
                )));
            }
        }
    }

    Ok(sequences)
}

/// Write sequences to a FASTA file
pub fn write_fasta<P: AsRef<Path>>(path: P, sequences: &[Sequence]) -> Result<(), MicronotaError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_fasta_to_writer(&mut writer, sequences)?;
    writer.flush()?;

    Ok(())
}

/// Write sequences to any writer
fn write_fasta_to_writer<W: Write>(
    writer: &mut W,
    sequences: &[Sequence],
) -> Result<(), MicronotaError> {
    for seq in sequences {
        writeln!(writer, "{}", seq.header())?;

        // 80-character sequence lines
        for chunk in seq.sequence.chunks(80) {
            writeln!(writer, "{}", String::from_utf8_lossy(chunk))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let input = b">WP_012345.1 hypothetical protein\nMKTA";
        let (remaining, (id, desc)) = parse_header(input).unwrap();
        assert_eq!(id, "WP_012345.1");
        assert_eq!(desc, Some("hypothetical protein"));
        assert_eq!(remaining, b"MKTA");
    }

    #[test]
    fn test_parse_buffer_multi_record() {
        let data = b">a first\nMKTA\nYIAK\n\n>b\nGGGG\n";
        let seqs = parse_fasta_buffer(data).unwrap();
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].id, "a");
        assert_eq!(seqs[0].description.as_deref(), Some("first"));
        assert_eq!(seqs[0].sequence, b"MKTAYIAK");
        assert_eq!(seqs[1].id, "b");
        assert!(seqs[1].description.is_none());
    }

    #[test]
    fn test_parse_buffer_lowercase_normalized() {
        let seqs = parse_fasta_buffer(b">a\nmkta\n").unwrap();
        assert_eq!(seqs[0].sequence, b"MKTA");
    }

    #[test]
    fn test_write_then_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seqs.fasta");
        let seqs = vec![
            Sequence::new("q1".to_string(), b"MKTAYIAKQR".to_vec())
                .with_description("test".to_string()),
            Sequence::new("q2".to_string(), vec![b'A'; 200]),
        ];

        write_fasta(&path, &seqs).unwrap();
        let parsed = parse_fasta(&path).unwrap();

        assert_eq!(parsed, seqs);
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let err = parse_fasta("/no/such/file.fasta").unwrap_err();
        assert!(matches!(err, MicronotaError::Io(_)));
    }
}
