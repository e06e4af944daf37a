// Fixture builders shared by the unit tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Assembles a minimal class file: header, a hand-built constant pool,
/// `access_flags` and an empty remainder.
pub struct ClassFileBuilder {
    pool: Vec<u8>,
    slots: u16,
    access: u16,
}

impl ClassFileBuilder {
    pub fn new() -> Self {
        Self {
            pool: Vec::new(),
            slots: 1,
            access: 0,
        }
    }

    pub fn utf8(mut self, value: &str) -> Self {
        self.pool.push(1);
        self.pool
            .extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.pool.extend_from_slice(value.as_bytes());
        self.slots += 1;
        self
    }

    pub fn class_ref(self, name_index: u16) -> Self {
        self.raw(7, &name_index.to_be_bytes(), 1)
    }

    pub fn long(self, value: i64) -> Self {
        self.raw(5, &value.to_be_bytes(), 2)
    }

    pub fn double(self, value: f64) -> Self {
        self.raw(6, &value.to_bits().to_be_bytes(), 2)
    }

    /// Append an entry verbatim, occupying `slots` pool indices.
    pub fn raw(mut self, tag: u8, body: &[u8], slots: u16) -> Self {
        self.pool.push(tag);
        self.pool.extend_from_slice(body);
        self.slots += slots;
        self
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access = flags;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pool.len() + 24);
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.slots.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&self.access.to_be_bytes());
        // this_class, super_class, interfaces, fields, methods, attributes
        for value in [2u16, 0, 0, 0, 0, 0] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out
    }
}

pub fn public_class(internal_name: &str) -> Vec<u8> {
    ClassFileBuilder::new()
        .utf8(internal_name)
        .class_ref(1)
        .long(42)
        .access(0x0021)
        .build()
}

pub fn private_class(internal_name: &str) -> Vec<u8> {
    ClassFileBuilder::new()
        .utf8(internal_name)
        .class_ref(1)
        .access(0x0020)
        .build()
}

/// Write a JAR holding `entries`, with an optional main-section manifest.
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)], manifest: Option<&str>) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);

    if let Some(manifest) = manifest {
        zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
    }
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a module JAR whose manifest carries `attributes` after
/// `OpenIDE-Module: <module>`.
pub fn write_module_jar(
    path: &Path,
    module: &str,
    attributes: &[(&str, &str)],
    entries: &[(&str, Vec<u8>)],
) {
    let mut manifest = String::from("Manifest-Version: 1.0\n");
    manifest.push_str(&format!("OpenIDE-Module: {}\n", module));
    for (key, value) in attributes {
        manifest.push_str(&format!("{}: {}\n", key, value));
    }
    manifest.push('\n');
    write_jar(path, entries, Some(&manifest));
}
