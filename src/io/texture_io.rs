//! Texture input: wrapping encoded images and working out their format.

use crate::core::texture::{Image, ImageFormat, Texture, TextureUtils};

/// Wraps encoded image bytes into a texture, resolving the mime type when `mime_type` is not given.
pub fn texture_from_encoded_data(data: Vec<u8>, filename: String, mime_type: Option<&str>) -> Texture {
    let mut image = Image::new();
    let mime_type = match mime_type {
        Some(mime) if !mime.is_empty() => mime.to_owned(),
        _ => guess_mime_type(&data, &filename),
    };
    image.set_mime_type(mime_type);
    image.set_filename(filename);
    image.set_encoded_data(data);

    let mut texture = Texture::new();
    texture.set_source_image(image);
    texture
}

/// Guesses the mime type from the image signature, then from the file extension.
/// Returns an empty string when neither is conclusive.
pub fn guess_mime_type(data: &[u8], filename: &str) -> String {
    let format = image_format_from_buffer(data);
    if format != ImageFormat::None {
        return TextureUtils::get_mime_type(format);
    }
    let format = TextureUtils::get_format(&TextureUtils::lowercase_file_extension(filename));
    TextureUtils::get_mime_type(format)
}

/// Returns the image format of an encoded texture stored in buffer.
/// ImageFormat::None is returned for unknown image formats.
pub fn image_format_from_buffer(buffer: &[u8]) -> ImageFormat {
    if buffer.len() > 2 {
        // Basis format signature 'B' * 256 + 's', or 0x4273
        let basis_signature = [0x42, 0x73];
        if buffer.starts_with(&basis_signature) {
            return ImageFormat::Basis;
        }
    }

    if buffer.len() > 4 {
        // KTX2 format signature 0xab 0x4b 0x54 0x58
        let ktx2_signature = [0xab, 0x4b, 0x54, 0x58];
        if buffer.starts_with(&ktx2_signature) {
            return ImageFormat::Basis;
        }
    }

    match image::guess_format(buffer) {
        Ok(image::ImageFormat::Png) => ImageFormat::Png,
        Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
        Ok(image::ImageFormat::WebP) => ImageFormat::Webp,
        _ => ImageFormat::None,
    }
}
