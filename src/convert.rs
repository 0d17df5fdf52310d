//! Device-format to BGR conversion for captured frames.

use std::convert::TryFrom;

use anyhow::{Result, anyhow};
use nokhwa::{Buffer, utils::FrameFormat};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_bgr, yuyv422_to_bgr,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

#[derive(Debug)]
pub struct BgrFrame {
    pub bgr: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn convert_camera_frame(frame: &Buffer) -> Result<BgrFrame> {
    let resolution = frame.resolution();
    let width = resolution.width_x;
    let height = resolution.height_y;
    let data = frame.buffer();

    let bgr = match frame.source_frame_format() {
        FrameFormat::NV12 => nv12_to_bgr(data, width, height)?,
        FrameFormat::YUYV => yuyv_to_bgr(data, width, height)?,
        FrameFormat::MJPEG => mjpeg_to_bgr(data, width, height)?,
        FrameFormat::RAWRGB => rgb_like_to_bgr(data, width, height, true)?,
        FrameFormat::RAWBGR => rgb_like_to_bgr(data, width, height, false)?,
        FrameFormat::GRAY => gray_to_bgr(data, width, height)?,
    };

    Ok(BgrFrame { bgr, width, height })
}

fn nv12_to_bgr(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_plane_len = width as usize * height as usize;
    let uv_plane_len = y_plane_len / 2;

    if data.len() < y_plane_len + uv_plane_len {
        return Err(anyhow!(
            "NV12 buffer too small: got {}, expected {}",
            data.len(),
            y_plane_len + uv_plane_len
        ));
    }

    let y_plane = &data[..y_plane_len];
    let uv_plane = &data[y_plane_len..y_plane_len + uv_plane_len];
    let mut bgr = vec![0u8; y_plane_len * 3];

    let image = YuvBiPlanarImage {
        y_plane,
        y_stride: width,
        uv_plane,
        uv_stride: width,
        width,
        height,
    };

    yuv_nv12_to_bgr(
        &image,
        &mut bgr,
        width * 3,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12→BGR failed: {err:?}"))?;

    Ok(bgr)
}

fn yuyv_to_bgr(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected_len = width as usize * height as usize * 2;
    if data.len() < expected_len {
        return Err(anyhow!(
            "YUYV buffer too small: got {}, expected {}",
            data.len(),
            expected_len
        ));
    }

    let mut bgr = vec![0u8; (width as usize * height as usize) * 3];
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    yuyv422_to_bgr(
        &packed,
        &mut bgr,
        width * 3,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422→BGR failed: {err:?}"))?;

    Ok(bgr)
}

fn mjpeg_to_bgr(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::BGR);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let bgr = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    let expected_len = usize::try_from(width)
        .and_then(|w| usize::try_from(height).map(|h| w * h * 3))
        .map_err(|_| anyhow!("MJPEG dimensions do not fit usize"))?;
    if bgr.len() < expected_len {
        return Err(anyhow!(
            "MJPEG decode produced too few bytes: got {}, expected {}",
            bgr.len(),
            expected_len
        ));
    }

    Ok(bgr)
}

fn rgb_like_to_bgr(data: &[u8], width: u32, height: u32, swap_rb: bool) -> Result<Vec<u8>> {
    let expected_len = width as usize * height as usize * 3;
    if data.len() < expected_len {
        return Err(anyhow!(
            "RGB buffer too small: got {}, expected {}",
            data.len(),
            expected_len
        ));
    }

    let mut bgr = vec![0u8; expected_len];
    bgr.par_chunks_exact_mut(3)
        .zip(data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            if swap_rb {
                dst[0] = src[2];
                dst[1] = src[1];
                dst[2] = src[0];
            } else {
                dst.copy_from_slice(&src[..3]);
            }
        });

    Ok(bgr)
}

fn gray_to_bgr(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected_len = width as usize * height as usize;
    if data.len() < expected_len {
        return Err(anyhow!(
            "GRAY buffer too small: got {}, expected {}",
            data.len(),
            expected_len
        ));
    }

    let mut bgr = vec![0u8; expected_len * 3];
    bgr.par_chunks_exact_mut(3)
        .zip(data.par_iter().copied())
        .for_each(|(dst, value)| {
            dst[0] = value;
            dst[1] = value;
            dst[2] = value;
        });

    Ok(bgr)
}
