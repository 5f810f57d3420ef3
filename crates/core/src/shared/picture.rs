use crate::shared::constants::RGB_CHANNELS;

/// Output pixel layouts the decoder can be asked to convert to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Packed 8-bit R, G, B with no row padding.
    Rgb24,
}

/// Borrowed view of the decoder's current display picture.
///
/// The bytes belong to the decoder and are only valid until it is parsed
/// again, so consumers copy what they need before returning.
#[derive(Clone, Copy, Debug)]
pub struct PictureView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> PictureView<'a> {
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * RGB_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
