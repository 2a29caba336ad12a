// src/config/defaults.rs
use crate::config::app::{CipherSettings, MigrationSettings};
use crate::consts::{DB_KDF_ITERATIONS, DB_PAGE_SIZE};
use crate::enums::{HmacAlgorithm, KdfAlgorithm};

pub fn default_cipher() -> CipherSettings {
    CipherSettings {
        page_size: DB_PAGE_SIZE,
        kdf_iter: DB_KDF_ITERATIONS,
        hmac_algorithm: HmacAlgorithm::HmacSha512,
        kdf_algorithm: KdfAlgorithm::Pbkdf2HmacSha512,
        plaintext_header_size: 0,
    }
}

pub fn default_migration() -> MigrationSettings {
    MigrationSettings {
        verify_row_counts: true,
        sync_before_replace: true,
        preserve_permissions: true,
    }
}
