//! MIDI short messages and the hex text form used at the scripting boundary.
//!
//! Inbound host MIDI is reinterpreted byte for byte into a [`ShortMessage`]
//! on the real-time thread. The control thread later renders each message as
//! lowercase space-separated hex (`"90 3c 64"`) for the script and UI.
//! Outbound MIDI arrives from the UI or script as the same text form and is
//! parsed strictly by [`parse_hex_message`]: exactly three tokens, each one
//! or two hex digits.

use std::fmt::{self, Write};
use std::time::Instant;

/// A MIDI 1.0 channel or system message of up to three bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShortMessage {
    data: [u8; 3],
}

impl ShortMessage {
    /// Create a message from three raw bytes.
    #[inline]
    pub const fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            data: [status, data1, data2],
        }
    }

    /// Reinterpret three raw bytes. No validation is performed.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self { data: bytes }
    }

    /// Reinterpret a host-delivered message of one to three bytes.
    ///
    /// Missing bytes are zero. Returns `None` for empty or longer messages
    /// (SysEx never fits a short message).
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > 3 {
            return None;
        }
        let mut data = [0u8; 3];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self { data })
    }

    /// Status byte.
    #[inline]
    pub const fn status(&self) -> u8 {
        self.data[0]
    }

    /// Channel (0-15) for channel messages.
    #[inline]
    pub const fn channel(&self) -> Option<u8> {
        match self.status() {
            0x80..=0xEF => Some(self.status() & 0x0F),
            _ => None,
        }
    }

    /// All three raw bytes, including unused trailing bytes.
    #[inline]
    pub const fn raw(&self) -> [u8; 3] {
        self.data
    }

    /// Number of significant bytes, derived from the status byte.
    pub const fn len(&self) -> usize {
        match self.status() {
            0x00 => 0,
            0x80..=0xBF | 0xE0..=0xEF | 0xF2 => 3,
            0xC0..=0xDF | 0xF1 | 0xF3 => 2,
            0xF0..=0xFF => 1,
            // Running-status data bytes carry no status of their own.
            _ => 3,
        }
    }

    /// Whether the message carries no bytes.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The significant bytes of the message.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Lowercase, space-separated hex of the significant bytes.
    ///
    /// Allocates; control thread only.
    pub fn to_hex_string(&self) -> String {
        let mut out = String::with_capacity(8);
        for (i, byte) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for ShortMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {},{},{} ]", self.data[0], self.data[1], self.data[2])
    }
}

/// MIDI received from the host, timestamped on the real-time thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingMidiEvent {
    /// When the callback that received the message started.
    pub time: Instant,
    /// The message.
    pub message: ShortMessage,
}

/// MIDI to be emitted by the real-time thread in a later callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutgoingMidiEvent {
    /// The message.
    pub message: ShortMessage,
    /// Destination index handed to the host buffer with the message.
    pub index: i32,
}

/// Reasons an outbound hex message is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiParseError {
    /// The text did not split into exactly three tokens.
    WrongTokenCount(usize),
    /// A token was not a one- or two-digit hex byte.
    InvalidHexByte(String),
}

impl fmt::Display for MidiParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongTokenCount(count) => {
                write!(f, "Message was not a 3 byte message ({count} tokens).")
            }
            Self::InvalidHexByte(token) => write!(f, "{token:?} is not a hex byte."),
        }
    }
}

impl std::error::Error for MidiParseError {}

fn parse_hex_byte(token: &str) -> Result<u8, MidiParseError> {
    let valid = (1..=2).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
        return Err(MidiParseError::InvalidHexByte(token.to_string()));
    }
    u8::from_str_radix(token, 16).map_err(|_| MidiParseError::InvalidHexByte(token.to_string()))
}

/// Parse whitespace-delimited hex byte pairs (e.g. `"90 3C 3C"`).
///
/// Tokens may be wrapped in double quotes. Succeeds only for exactly three
/// valid hex bytes.
pub fn parse_hex_message(text: &str) -> Result<ShortMessage, MidiParseError> {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .map(|token| token.trim_matches('"'))
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.len() != 3 {
        return Err(MidiParseError::WrongTokenCount(tokens.len()));
    }

    Ok(ShortMessage::new(
        parse_hex_byte(tokens[0])?,
        parse_hex_byte(tokens[1])?,
        parse_hex_byte(tokens[2])?,
    ))
}
