//! `srmp` binary for inspecting SRMP frames from the terminal.
//!
//! Encodes payloads to hex, decodes hex streams into messages and shows how
//! a payload is split into group chunks.

mod cli;

use std::error::Error;

use bytes::{Bytes, BytesMut};
use clap::Parser;
use cli::{Cli, Command, DecodeArgs, EncodeArgs, ModeArg, PayloadArg, SplitArgs};
use srmp::{
    AssemblerConfig,
    DefaultMessage,
    GroupId,
    GroupMessage,
    GroupTable,
    Message,
    MessageKindRegistry,
    Mode,
    StreamFrameAssembler,
    group,
};

fn main() -> Result<(), Box<dyn Error>> {
    // Diagnostics such as cache eviction go to the subscriber.
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Encode(args) => encode(&args),
        Command::Decode(args) => decode(&args),
        Command::Split(args) => split(&args),
    }
}

fn payload_bytes(arg: &PayloadArg) -> Result<Bytes, hex::FromHexError> {
    if arg.hex {
        Ok(hex::decode(arg.payload.trim())?.into())
    } else {
        Ok(Bytes::copy_from_slice(arg.payload.as_bytes()))
    }
}

const fn mode(arg: ModeArg) -> Mode {
    match arg {
        ModeArg::Request => Mode::Request,
        ModeArg::OneWay => Mode::OneWay,
        ModeArg::Reply => Mode::Reply,
        ModeArg::ReplyError => Mode::ReplyError,
    }
}

fn encode(args: &EncodeArgs) -> Result<(), Box<dyn Error>> {
    let message = DefaultMessage::new(payload_bytes(&args.payload)?)
        .with_flag(args.flag)
        .with_sequence(args.sequence)
        .with_mode(mode(args.mode));

    if args.text {
        println!("{}", message.encode_text()?);
        return Ok(());
    }
    let mut wire = BytesMut::new();
    if args.envelope {
        MessageKindRegistry::with_builtin().encode(&message, &mut wire)?;
    } else {
        message.encode(&mut wire)?;
    }
    println!("{}", hex::encode(wire));
    Ok(())
}

fn decode(args: &DecodeArgs) -> Result<(), Box<dyn Error>> {
    let input = Bytes::from(hex::decode(args.input.trim())?);
    let lines = if args.envelope {
        describe_envelopes(input)
    } else {
        describe_frames(input)?
    };
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn describe_frames(input: Bytes) -> Result<Vec<String>, Box<dyn Error>> {
    let assembler = StreamFrameAssembler::srmp(AssemblerConfig::default());
    let mut lines = Vec::new();
    for frame in &assembler.feed(input) {
        lines.push(describe_default(&DefaultMessage::decode_frame(frame)?));
    }
    lines.extend(leftover(assembler.buffered_len()));
    Ok(lines)
}

/// Decode an envelope stream, reporting bad frames and bad chunks in place.
fn describe_envelopes(input: Bytes) -> Vec<String> {
    let registry = MessageKindRegistry::with_builtin();
    let assembler = StreamFrameAssembler::new(registry.clone(), AssemblerConfig::default());
    let groups = GroupTable::new();
    let mut lines = Vec::new();
    for frame in assembler.feed(input) {
        let message = match registry.decode_frame(&frame) {
            Ok(message) => message,
            Err(err) => {
                srmp::metrics::inc_decode_errors(err.error_type());
                lines.push(format!("error: {err}"));
                continue;
            }
        };
        if let Some(default) = message.downcast_ref::<DefaultMessage>() {
            lines.push(describe_default(default));
        } else if let Some(chunk) = message.downcast_ref::<GroupMessage>() {
            lines.push(format!(
                "chunk group={} index={} count={} len={}",
                chunk.group_id(),
                chunk.index(),
                chunk.count(),
                chunk.data().len()
            ));
            match groups.add(chunk.clone()) {
                Ok(Some(group)) => lines.push(format!(
                    "group {} complete: {}",
                    group.group_id(),
                    hex::encode(group.payload())
                )),
                Ok(None) => {}
                Err(err) => lines.push(format!("error: {err}")),
            }
        }
    }
    lines.extend(leftover(assembler.buffered_len()));
    lines
}

fn describe_default(message: &DefaultMessage) -> String {
    format!(
        "message seq={} flag={} mode={:?} len={} payload={}",
        message.sequence(),
        message.flag(),
        message.mode(),
        message.payload().len(),
        hex::encode(message.payload())
    )
}

fn leftover(buffered: usize) -> Option<String> {
    (buffered > 0).then(|| format!("incomplete: {buffered} trailing bytes"))
}

fn split(args: &SplitArgs) -> Result<(), Box<dyn Error>> {
    let payload = payload_bytes(&args.payload)?;
    let registry = MessageKindRegistry::with_builtin();
    let chunks = group::split(&payload, args.max_frame_size, GroupId::new(args.group_id))?;

    for chunk in &chunks {
        let mut wire = BytesMut::new();
        registry.encode(chunk, &mut wire)?;
        println!("{}", hex::encode(wire));
    }
    Ok(())
}
