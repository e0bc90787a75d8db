use crate::error::Result;
use crate::models::DemandRecord;
use crate::utils::constants::DEFAULT_ROW_GROUP_SIZE;
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::Timelike;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(crate::error::ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }

    /// Stream several tables into one Parquet file, one table in memory at a
    /// time. The file only appears at `path` once it is complete.
    pub fn write_tables<I>(&self, tables: I, path: &Path) -> Result<usize>
    where
        I: IntoIterator<Item = Result<Vec<DemandRecord>>>,
    {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;

        let schema = self.create_schema();
        let temp = NamedTempFile::new_in(dir)?;
        let mut writer = ArrowWriter::try_new(temp.reopen()?, schema.clone(), Some(self.properties()))?;

        let mut total = 0;
        for table in tables {
            let table = table?;
            for chunk in table.chunks(self.row_group_size.max(1)) {
                let batch = self.records_to_batch(chunk, schema.clone())?;
                writer.write(&batch)?;
            }
            total += table.len();
        }
        writer.close()?;

        temp.persist(path).map_err(|e| e.error)?;
        Ok(total)
    }

    /// Create Arrow schema for demand data
    fn create_schema(&self) -> Arc<Schema> {
        let fields = vec![
            Field::new("cluster_id", DataType::UInt32, false),
            Field::new("L1", DataType::Utf8, false),
            Field::new("L2", DataType::Utf8, false),
            Field::new("weekday", DataType::UInt32, false),
            Field::new("holiday", DataType::UInt8, false),
            Field::new("time", DataType::Time32(TimeUnit::Second), false),
            Field::new("month", DataType::UInt32, false),
            Field::new("clear_sky", DataType::UInt8, false),
            Field::new("extreme_weather", DataType::UInt8, false),
            Field::new("hum", DataType::UInt32, false),
            Field::new("rain", DataType::UInt8, false),
            Field::new("temp", DataType::UInt32, false),
            Field::new("wind", DataType::UInt8, false),
            Field::new("wintry", DataType::UInt8, false),
            Field::new("demand", DataType::Int64, false),
        ];

        Arc::new(Schema::new(fields))
    }

    /// Convert records to Arrow RecordBatch
    fn records_to_batch(&self, records: &[DemandRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
        let u8_column = |f: fn(&DemandRecord) -> u8| -> ArrayRef {
            Arc::new(UInt8Array::from(records.iter().map(f).collect::<Vec<u8>>()))
        };
        let u32_column = |f: fn(&DemandRecord) -> u32| -> ArrayRef {
            Arc::new(UInt32Array::from(records.iter().map(f).collect::<Vec<u32>>()))
        };

        let l1: Vec<&str> = records.iter().map(|r| r.l1.as_str()).collect();
        let l2: Vec<&str> = records.iter().map(|r| r.l2.as_str()).collect();
        let times: Vec<i32> = records
            .iter()
            .map(|r| r.time.num_seconds_from_midnight() as i32)
            .collect();
        let demand: Vec<i64> = records.iter().map(|r| r.demand).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                u32_column(|r| r.cluster_id),
                Arc::new(StringArray::from(l1)),
                Arc::new(StringArray::from(l2)),
                u32_column(|r| r.weekday),
                u8_column(|r| r.holiday),
                Arc::new(Time32SecondArray::from(times)),
                u32_column(|r| r.month),
                u8_column(|r| r.clear_sky),
                u8_column(|r| r.extreme_weather),
                u32_column(|r| r.hum),
                u8_column(|r| r.rain),
                u32_column(|r| r.temp),
                u8_column(|r| r.wind),
                u8_column(|r| r.wintry),
                Arc::new(Int64Array::from(demand)),
            ],
        )?;

        Ok(batch)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();
        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }
        // codec as written, falling back to this writer's for an empty file
        let compression = metadata
            .row_groups()
            .first()
            .and_then(|rg| rg.columns().first())
            .map(|c| c.compression())
            .unwrap_or(self.compression);

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression,
            columns,
        })
    }

    /// Count of rows per demand value
    pub fn demand_histogram(&self, path: &Path) -> Result<Vec<(i64, usize)>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
        use std::collections::BTreeMap;

        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
        for batch in reader {
            let batch = batch?;
            let demand = batch
                .column_by_name("demand")
                .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                .ok_or_else(|| {
                    crate::error::ProcessingError::Config(
                        "Invalid demand column type".to_string(),
                    )
                })?;
            for value in demand.iter().flatten() {
                *histogram.entry(value).or_insert(0) += 1;
            }
        }

        Ok(histogram.into_iter().collect())
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Columns: {}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            self.columns.join(", "),
            self.total_rows as f64 / self.row_groups.max(1) as f64
        )
    }
}
