//! Command line interface for the `srmp` inspection binary.
//!
//! Frames are read and written as hex so they can be pasted between
//! packet captures and the terminal.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command line arguments for the `srmp` binary.
#[derive(Debug, Parser)]
#[command(name = "srmp", version, about = "Encode, decode and split SRMP frames")]
pub struct Cli {
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of the `srmp` binary.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode a payload as one SRMP frame and print it as hex.
    Encode(EncodeArgs),
    /// Decode a hex byte stream and print every frame it contains.
    Decode(DecodeArgs),
    /// Split a payload into group chunks and print each envelope as hex.
    Split(SplitArgs),
}

/// Delivery mode accepted on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// A request expecting a reply.
    #[default]
    Request,
    /// A request that expects no reply.
    OneWay,
    /// A successful reply.
    Reply,
    /// A reply carrying an error.
    ReplyError,
}

/// Payload given either as literal text or as hex.
#[derive(Debug, Args)]
pub struct PayloadArg {
    /// Treat the payload as hex instead of UTF-8 text.
    #[arg(long)]
    pub hex: bool,

    /// Payload bytes.
    pub payload: String,
}

/// Arguments for `srmp encode`.
#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// Six-bit user flag.
    #[arg(short, long, default_value_t = 0)]
    pub flag: u8,

    /// Sequence byte.
    #[arg(short, long, default_value_t = 0)]
    pub sequence: u8,

    /// Delivery mode.
    #[arg(short, long, value_enum, default_value_t = ModeArg::Request)]
    pub mode: ModeArg,

    /// Wrap the frame in a typed envelope.
    #[arg(long)]
    pub envelope: bool,

    /// Print the text form instead of hex.
    #[arg(long, conflicts_with = "envelope")]
    pub text: bool,

    #[command(flatten)]
    pub payload: PayloadArg,
}

/// Arguments for `srmp decode`.
#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Input is a stream of typed envelopes rather than bare frames.
    #[arg(long)]
    pub envelope: bool,

    /// Hex-encoded byte stream.
    pub input: String,
}

/// Arguments for `srmp split`.
#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Largest encoded chunk body, in bytes.
    #[arg(short = 'n', long, default_value_t = 1024)]
    pub max_frame_size: usize,

    /// Group identifier shared by the chunks.
    #[arg(short, long, default_value_t = 0)]
    pub group_id: u64,

    #[command(flatten)]
    pub payload: PayloadArg,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;

    #[test]
    fn parses_encode_options() {
        let cli = Cli::parse_from([
            "srmp", "encode", "--flag", "1", "--sequence", "7", "--mode", "one-way", "Open",
        ]);
        let Command::Encode(args) = cli.command else {
            panic!("expected encode subcommand");
        };
        assert_eq!(args.flag, 1);
        assert_eq!(args.sequence, 7);
        assert_eq!(args.mode, ModeArg::OneWay);
        assert_eq!(args.payload.payload, "Open");
        assert!(!args.payload.hex);
    }

    #[rstest]
    #[case(&["srmp", "decode", "01070400"], false)]
    #[case(&["srmp", "decode", "--envelope", "01"], true)]
    fn parses_decode_envelope_flag(#[case] argv: &[&str], #[case] envelope: bool) {
        let cli = Cli::parse_from(argv.iter().copied());
        assert!(matches!(cli.command, Command::Decode(args) if args.envelope == envelope));
    }

    #[test]
    fn split_defaults_apply() {
        let cli = Cli::parse_from(["srmp", "split", "--hex", "00ff"]);
        let Command::Split(args) = cli.command else {
            panic!("expected split subcommand");
        };
        assert_eq!(args.max_frame_size, 1024);
        assert_eq!(args.group_id, 0);
        assert!(args.payload.hex);
    }

    #[test]
    fn text_output_conflicts_with_envelope() {
        let result = Cli::try_parse_from(["srmp", "encode", "--text", "--envelope", "x"]);
        assert!(result.is_err());
    }
}
