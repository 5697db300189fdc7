#![allow(dead_code)]

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;

pub const BUSINESS: &str = "yelp_academic_dataset_business.json";
pub const CHECKIN: &str = "yelp_academic_dataset_checkin.json";
pub const REVIEW: &str = "yelp_academic_dataset_review.json";
pub const USER: &str = "yelp_academic_dataset_user.json";
pub const TIP: &str = "yelp_academic_dataset_tip.json";
pub const PHOTO: &str = "yelp_academic_dataset_photo.json";

pub fn jsonl(values: &[Value]) -> String {
    let mut out = String::new();
    for value in values {
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

fn append_files<W: Write>(builder: &mut tar::Builder<W>, files: &[(&str, &str)]) {
    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_size(0);
    dir.set_mode(0o755);
    builder
        .append_data(&mut dir, "yelp_dataset/", io::empty())
        .expect("append dir");
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, format!("yelp_dataset/{name}"), contents.as_bytes())
            .expect("append file");
    }
}

pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    append_files(&mut builder, files);
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

pub fn plain_tar(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    append_files(&mut builder, files);
    builder.into_inner().expect("finish tar")
}

pub fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, bytes) in members {
        zip.start_file(*name, options).expect("start member");
        zip.write_all(bytes).expect("write member");
    }
    zip.finish().expect("finish zip");
}

/// A `Yelp-JSON.zip` lookalike: a junk resource fork plus the gzip tar.
pub fn dataset_zip(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("Yelp-JSON.zip");
    let packed = tar_gz(files);
    write_zip(
        &path,
        &[
            ("__MACOSX/Yelp JSON/._yelp_dataset.tar", b"junk".as_slice()),
            ("Yelp JSON/yelp_dataset.tar", packed.as_slice()),
        ],
    );
    path
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("compress");
    encoder.finish().expect("finish gzip")
}

/// The tar split in two halves, each compressed as its own gzip member and
/// concatenated, as `pigz` or `cat a.gz b.gz` would produce.
pub fn multi_member_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let packed = plain_tar(files);
    let (head, tail) = packed.split_at(packed.len() / 2);
    let mut joined = gzip(head);
    joined.extend(gzip(tail));
    joined
}
