#![no_main]
use libfuzzer_sys::fuzz_target;
use png_rgba_decoder::{DecoderOptions, PngDecoder};

fuzz_target!(|data: &[u8]| {
    let options = DecoderOptions { max_image_bytes: Some(64 * 1024 * 1024), ..Default::default() };

    if let Ok(decoder) = PngDecoder::with_options(data, &options) {
        if let Ok(image) = decoder.decode() {
            let header = decoder.header();
            assert_eq!(image.data.len(), header.width as usize * header.height as usize * 4);
        }
        let _ = decoder.decode_pixels();
    }
});
