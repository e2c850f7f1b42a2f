pub mod discovery;
pub mod error;
pub mod mapping_table;
pub mod matching;

pub use discovery::{
    find_files_with_suffix, first_file_with_suffix, list_files_with_suffix, list_subject_folders,
};
pub use error::{IngestError, Result};
pub use mapping_table::{
    ANONYMIZED_ID_COLUMN, MappingColumns, MappingTable, RAW_ID_COLUMN, load_mapping_table,
    mapping_from_cells,
};
pub use matching::{contains_raw_id, match_physio_file, match_subject_folder};
