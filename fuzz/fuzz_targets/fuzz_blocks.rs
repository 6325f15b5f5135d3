#![no_main]
use libfuzzer_sys::fuzz_target;
use zenblocks::*;

const FORMATS: [PixelFormat; 22] = [
    PixelFormat::Alpha8,
    PixelFormat::Gray8,
    PixelFormat::Alpha16,
    PixelFormat::Gray16,
    PixelFormat::Rg88,
    PixelFormat::GrayAlpha88,
    PixelFormat::Rg1616,
    PixelFormat::Rgb565,
    PixelFormat::Rgb555,
    PixelFormat::Rgb24,
    PixelFormat::Bgr24,
    PixelFormat::Rgb888x,
    PixelFormat::Bgr888x,
    PixelFormat::Rgb101010x,
    PixelFormat::Bgr101010x,
    PixelFormat::Argb4444,
    PixelFormat::Rgba8888,
    PixelFormat::Bgra8888,
    PixelFormat::Rgba1010102,
    PixelFormat::Bgra1010102,
    PixelFormat::Rgba16161616,
    PixelFormat::RgbaF32,
];

fuzz_target!(|data: &[u8]| {
    // [format, alpha, width, height, n_requests, requests (5 bytes each)..., pixels...]
    if data.len() < 5 {
        return;
    }
    let format = FORMATS[data[0] as usize % FORMATS.len()];
    let alpha = match data[1] % 3 {
        0 => AlphaMode::Opaque,
        1 => AlphaMode::Premultiplied,
        _ => AlphaMode::Unpremultiplied,
    };
    let width = u32::from(data[2] % 64);
    let height = u32::from(data[3] % 64);
    let n_requests = (data[4] % 16) as usize;
    let Some(requests) = data.get(5..5 + n_requests * 5) else {
        return;
    };
    let pixels = &data[5 + n_requests * 5..];

    // Short or odd-sized buffers must be rejected, never panic
    let Ok(bitmap) = Bitmap::borrowed(pixels, width, height, SourceFormat::new(format, alpha))
    else {
        return;
    };
    let Ok(mut src) = BlockSource::open(bitmap) else {
        return;
    };

    for req in requests.chunks_exact(5) {
        let component = usize::from(req[0] % 5);
        let rect = Rect::new(
            u32::from(req[1] % 64),
            u32::from(req[2] % 64),
            u32::from(req[3] % 64),
            u32::from(req[4] % 64),
        );
        let reference = src
            .get_reference(component, rect)
            .map(|b| b.to_vec().unwrap_or_default());
        let copy = src.get_copy(component, rect);
        match (reference, copy) {
            (Ok(a), Ok(b)) => assert_eq!(a, b, "reference and copy reads disagree"),
            (Err(_), Err(_)) => {}
            (a, b) => panic!("reads disagree: {a:?} vs {b:?}"),
        }
    }

    src.close();
    assert!(matches!(
        src.get_reference(0, Rect::new(0, 0, 1, 1)),
        Err(BlockError::SourceClosed)
    ));
});
