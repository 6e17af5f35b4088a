// Payload conversion helpers
//
// Thin pass-throughs over the csv and image crates for the two asset
// shapes the catalogs we target actually serve: CSV tables and
// single-band rasters.

use bytes::Bytes;
use ndarray::Array2;

use crate::errors::ConvertError;

/// Parsed CSV content: a header row plus string records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse CSV bytes into a table.
pub fn csv_table(data: &Bytes) -> Result<CsvTable, ConvertError> {
    let mut reader = csv::Reader::from_reader(data.as_ref());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(CsvTable { headers, rows })
}

/// Decode raster bytes into a 2-D array of the first band.
///
/// Values are the decoded luma channel as f32; shape is (height, width).
pub fn raster_to_array(data: &Bytes) -> Result<Array2<f32>, ConvertError> {
    let decoded = image::load_from_memory(data)?;
    let band = decoded.to_luma32f();
    let (width, height) = band.dimensions();

    Array2::from_shape_vec((height as usize, width as usize), band.into_raw())
        .map_err(|_| ConvertError::Dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_table_headers_and_rows() {
        let data = Bytes::from_static(b"station,lat,lon\nA,10.5,-3.2\nB,11.0,-4.0\n");
        let table = csv_table(&data).unwrap();

        assert_eq!(table.headers, vec!["station", "lat", "lon"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec!["A", "10.5", "-3.2"]);
    }

    #[test]
    fn test_empty_csv_has_no_rows() {
        let data = Bytes::from_static(b"a,b\n");
        let table = csv_table(&data).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers, vec!["a", "b"]);
    }

    #[test]
    fn test_raster_to_array_shape() {
        // 2x3 grayscale PNG built in memory.
        let img = image::GrayImage::from_fn(3, 2, |x, y| image::Luma([(x + y) as u8 * 10]));
        let mut png = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageFormat::Png,
        )
        .unwrap();

        let array = raster_to_array(&Bytes::from(png)).unwrap();
        assert_eq!(array.shape(), &[2, 3]);
    }

    #[test]
    fn test_garbage_raster_is_error() {
        let err = raster_to_array(&Bytes::from_static(b"not an image")).unwrap_err();
        assert!(matches!(err, ConvertError::Raster(_)));
    }
}
