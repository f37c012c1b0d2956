use super::*;
use crate::stack::source::StackSource;
use image::{ImageBuffer, Luma, Rgb};

#[test]
fn luma8_stays_8_bit() {
    let img = DynamicImage::ImageLuma8(ImageBuffer::from_raw(2, 1, vec![3u8, 250]).unwrap());
    let slices = image_to_slices(&img, ColorHandling::Luma).unwrap();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].data(), &SampleData::U8(vec![3, 250]));
}

#[test]
fn luma16_stays_16_bit() {
    let img = DynamicImage::ImageLuma16(
        ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(2, 1, vec![1000, 65535]).unwrap(),
    );
    let slices = image_to_slices(&img, ColorHandling::Luma).unwrap();
    assert_eq!(slices[0].data(), &SampleData::U16(vec![1000, 65535]));
}

#[test]
fn split_rgb_produces_three_planes() {
    let img = DynamicImage::ImageRgb8(
        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap(),
    );
    let slices = image_to_slices(&img, ColorHandling::SplitRgb).unwrap();
    assert_eq!(slices.len(), 3);
    assert_eq!(slices[0].data(), &SampleData::U8(vec![1, 4]));
    assert_eq!(slices[1].data(), &SampleData::U8(vec![2, 5]));
    assert_eq!(slices[2].data(), &SampleData::U8(vec![3, 6]));
}

#[test]
fn float_images_decode_to_float_slices() {
    let img = DynamicImage::ImageRgb32F(
        ImageBuffer::<Rgb<f32>, Vec<f32>>::from_raw(1, 1, vec![0.5, 0.25, 2.0]).unwrap(),
    );
    let slices = image_to_slices(&img, ColorHandling::SplitRgb).unwrap();
    assert_eq!(slices[2].data(), &SampleData::F32(vec![2.0]));
    let luma = image_to_slices(&img, ColorHandling::Luma).unwrap();
    assert!(matches!(luma[0].data(), SampleData::F32(_)));
}

#[test]
fn slices_per_image() {
    assert_eq!(ColorHandling::Luma.slices_per_image(), 1);
    assert_eq!(ColorHandling::SplitRgb.slices_per_image(), 3);
}

#[test]
fn load_stack_reads_files_in_order() {
    let dir = std::path::PathBuf::from("target").join("unit_io_decode");
    std::fs::create_dir_all(&dir).unwrap();
    let mut paths = Vec::new();
    for (i, v) in [10u8, 20, 30].iter().enumerate() {
        let p = dir.join(format!("z{i}.png"));
        ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(2, 2, vec![*v; 4])
            .unwrap()
            .save(&p)
            .unwrap();
        paths.push(p);
    }
    let stack = load_stack(&paths, ColorHandling::Luma).unwrap();
    assert_eq!(stack.len(), 3);
    assert_eq!(stack.dims(), SliceDims::new(2, 2));
    assert_eq!(stack.slice_at(2).unwrap().sample(1, 1), Some(30.0));
}

#[test]
fn missing_file_is_wrapped_error() {
    let err = load_stack(&["target/definitely/missing.png"], ColorHandling::Luma).unwrap_err();
    assert!(err.to_string().contains("missing.png"));
}
