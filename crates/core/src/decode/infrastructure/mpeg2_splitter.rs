use std::collections::VecDeque;

use crate::shared::stream_metadata::StreamMetadata;

const PICTURE_START_CODE: u8 = 0x00;
const SEQUENCE_HEADER_CODE: u8 = 0xB3;
const EXTENSION_START_CODE: u8 = 0xB5;
const SEQUENCE_END_CODE: u8 = 0xB7;
const GROUP_START_CODE: u8 = 0xB8;

const SEQUENCE_EXTENSION_ID: u32 = 1;

/// Bytes after the start code needed to read width, height and frame rate.
const SEQUENCE_HEADER_LEN: usize = 4;
/// Bytes after the start code needed to reach frame_rate_extension_d.
const SEQUENCE_EXTENSION_LEN: usize = 6;

/// Frame period per `frame_rate_code`, in 27 MHz ticks. Codes 9-13 are
/// common non-standard rates; 0, 14 and 15 are forbidden/reserved.
const FRAME_PERIODS: [u32; 16] = [
    0, 1_126_125, 1_125_000, 1_080_000, 900_900, 900_000, 540_000, 450_450, 450_000, 1_800_000,
    5_400_000, 2_700_000, 2_250_000, 1_800_000, 0, 0,
];

/// Fields of an MPEG-1/2 sequence header (plus its MPEG-2 extension).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceHeader {
    pub width: u32,
    pub height: u32,
    pub frame_rate_code: u8,
    pub frame_period: u32,
}

impl SequenceHeader {
    /// Parses the bytes following a `00 00 01 B3` start code.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < SEQUENCE_HEADER_LEN {
            return None;
        }
        let width = read_bits(payload, 0, 12);
        let height = read_bits(payload, 12, 12);
        let frame_rate_code = read_bits(payload, 28, 4) as u8;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            frame_rate_code,
            frame_period: FRAME_PERIODS[frame_rate_code as usize],
        })
    }

    /// Applies a sequence extension (the bytes following `00 00 01 B5`).
    /// Other extension kinds are ignored.
    pub fn apply_extension(&mut self, payload: &[u8]) {
        if payload.len() < SEQUENCE_EXTENSION_LEN
            || read_bits(payload, 0, 4) != SEQUENCE_EXTENSION_ID
        {
            return;
        }
        let horizontal_ext = read_bits(payload, 15, 2);
        let vertical_ext = read_bits(payload, 17, 2);
        let rate_n = read_bits(payload, 41, 2) as u64;
        let rate_d = read_bits(payload, 43, 5) as u64;

        self.width = (self.width & 0xFFF) | (horizontal_ext << 12);
        self.height = (self.height & 0xFFF) | (vertical_ext << 12);
        let base = FRAME_PERIODS[self.frame_rate_code as usize] as u64;
        self.frame_period = (base * (rate_d + 1) / (rate_n + 1)) as u32;
    }

    pub fn metadata(&self) -> StreamMetadata {
        StreamMetadata {
            width: self.width,
            height: self.height,
            frame_period: self.frame_period,
        }
    }
}

/// Reads `len` (<= 32) bits MSB-first starting at bit `start`.
fn read_bits(data: &[u8], start: usize, len: usize) -> u32 {
    let mut value = 0u32;
    for bit in start..start + len {
        let byte = data[bit / 8];
        value = (value << 1) | u32::from((byte >> (7 - bit % 8)) & 1);
    }
    value
}

fn find_start_code(data: &[u8], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(3)
        .position(|window| window == [0x00, 0x00, 0x01])
        .map(|p| p + from)
}

/// Cuts a raw MPEG-2 video elementary stream into access units (one coded
/// picture each, with any preceding sequence/GOP headers attached).
///
/// Bytes arrive in arbitrary chunks through [`push`](Self::push); a unit is
/// only emitted once the start code that follows it has been seen, or on
/// [`finish`](Self::finish).
#[derive(Default)]
pub struct Mpeg2Splitter {
    buf: Vec<u8>,
    scan_pos: usize,
    unit_has_picture: bool,
    current: Option<SequenceHeader>,
    announced: Option<SequenceHeader>,
    new_sequence: Option<SequenceHeader>,
    units: VecDeque<Vec<u8>>,
}

impl Mpeg2Splitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.scan();
    }

    /// Marks the end of the available data: the pending unit is emitted if
    /// it holds a picture, anything else is discarded.
    pub fn finish(&mut self) {
        if self.unit_has_picture {
            self.units.push_back(std::mem::take(&mut self.buf));
        }
        self.buf.clear();
        self.scan_pos = 0;
        self.unit_has_picture = false;
    }

    pub fn next_unit(&mut self) -> Option<Vec<u8>> {
        self.units.pop_front()
    }

    pub fn pending_units(&self) -> usize {
        self.units.len()
    }

    /// Returns a sequence header seen for the first time (or differing from
    /// the previous one), once.
    pub fn take_new_sequence(&mut self) -> Option<SequenceHeader> {
        self.new_sequence.take()
    }

    fn scan(&mut self) {
        loop {
            let Some(sc) = find_start_code(&self.buf, self.scan_pos) else {
                // A start code may straddle the next chunk.
                self.scan_pos = self.buf.len().saturating_sub(2).max(self.scan_pos);
                return;
            };
            let Some(&code) = self.buf.get(sc + 3) else {
                self.scan_pos = sc;
                return;
            };

            let starts_unit = matches!(
                code,
                SEQUENCE_HEADER_CODE | GROUP_START_CODE | PICTURE_START_CODE
            );
            if starts_unit && self.unit_has_picture {
                self.emit_until(sc);
                continue;
            }

            let payload = &self.buf[sc + 4..];
            match code {
                SEQUENCE_HEADER_CODE => {
                    if payload.len() < SEQUENCE_HEADER_LEN {
                        self.scan_pos = sc;
                        return;
                    }
                    self.current = SequenceHeader::parse(payload);
                }
                EXTENSION_START_CODE => {
                    if payload.len() < SEQUENCE_EXTENSION_LEN {
                        self.scan_pos = sc;
                        return;
                    }
                    if let Some(header) = self.current.as_mut() {
                        header.apply_extension(payload);
                    }
                }
                PICTURE_START_CODE => {
                    self.unit_has_picture = true;
                    if self.current.is_some() && self.current != self.announced {
                        self.announced = self.current;
                        self.new_sequence = self.current;
                    }
                }
                SEQUENCE_END_CODE if self.unit_has_picture => {
                    self.emit_until(sc + 4);
                    continue;
                }
                _ => {}
            }
            self.scan_pos = sc + 4;
        }
    }

    fn emit_until(&mut self, end: usize) {
        let rest = self.buf.split_off(end);
        self.units.push_back(std::mem::replace(&mut self.buf, rest));
        self.scan_pos = 0;
        self.unit_has_picture = false;
    }
}
