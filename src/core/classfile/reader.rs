use std::io::{self, Read};

use super::ClassFormatError;

/// `ACC_PUBLIC` bit of a class file's `access_flags`.
pub const ACC_PUBLIC: u16 = 0x0001;

/// `magic` (u4) + `minor_version` (u2) + `major_version` (u2).
const HEADER_LEN: u64 = 8;

/// How a constant pool entry is skipped, keyed by its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstantSkip {
    /// u2 length followed by that many bytes.
    Utf8,
    /// A fixed number of bytes after the tag.
    Fixed(u64),
    /// Eight bytes, and the entry occupies two pool slots.
    Wide,
}

impl ConstantSkip {
    fn for_tag(tag: u8) -> Option<Self> {
        match tag {
            // Utf8
            1 => Some(Self::Utf8),
            // Integer, Float, Fieldref, Methodref, InterfaceMethodref,
            // NameAndType, Dynamic, InvokeDynamic
            3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => Some(Self::Fixed(4)),
            // Long, Double
            5 | 6 => Some(Self::Wide),
            // Class, String, MethodType, Module, Package
            7 | 8 | 16 | 19 | 20 => Some(Self::Fixed(2)),
            // MethodHandle
            15 => Some(Self::Fixed(3)),
            _ => None,
        }
    }
}

/// Forward-only reader that tracks its offset for error reporting.
struct SkipReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> SkipReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ClassFormatError> {
        let mut buf = [0u8; N];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => {
                self.offset += N as u64;
                Ok(buf)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ClassFormatError::Truncated {
                needed: N as u64,
                offset: self.offset,
            }),
            Err(source) => Err(ClassFormatError::Io {
                offset: self.offset,
                source,
            }),
        }
    }

    fn read_u1(&mut self) -> Result<u8, ClassFormatError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u2(&mut self) -> Result<u16, ClassFormatError> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    fn skip(&mut self, len: u64) -> Result<(), ClassFormatError> {
        let mut limited = (&mut self.inner).take(len);
        let copied = match io::copy(&mut limited, &mut io::sink()) {
            Ok(copied) => copied,
            Err(source) => {
                return Err(ClassFormatError::Io {
                    offset: self.offset,
                    source,
                })
            }
        };
        if copied < len {
            return Err(ClassFormatError::Truncated {
                needed: len - copied,
                offset: self.offset + copied,
            });
        }
        self.offset += len;
        Ok(())
    }
}

/// Decide whether a class file declares a public type.
///
/// Reads the header, skips the constant pool and returns the `ACC_PUBLIC`
/// bit of `access_flags`. Nothing after `access_flags` is read.
pub fn is_public_class<R: Read>(input: R) -> Result<bool, ClassFormatError> {
    let mut reader = SkipReader::new(input);
    reader.skip(HEADER_LEN)?;

    // Slot 0 is unused; Long and Double take two slots.
    let count = u32::from(reader.read_u2()?);
    let mut index: u32 = 1;
    while index < count {
        let tag = reader.read_u1()?;
        let rule = ConstantSkip::for_tag(tag).ok_or(ClassFormatError::UnknownConstantTag {
            tag,
            index: index as u16,
        })?;
        match rule {
            ConstantSkip::Utf8 => {
                let len = reader.read_u2()?;
                reader.skip(u64::from(len))?;
            }
            ConstantSkip::Fixed(len) => reader.skip(len)?,
            ConstantSkip::Wide => {
                reader.skip(8)?;
                index += 1;
            }
        }
        index += 1;
    }

    let access_flags = reader.read_u2()?;
    Ok(access_flags & ACC_PUBLIC != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testutil::ClassFileBuilder;

    // Compiled by javac 17 from fixtures/Constants.java.
    const CONSTANTS: &[u8] = include_bytes!("fixtures/Constants.class");
    const CONSTANTS_INNER: &[u8] = include_bytes!("fixtures/Constants$Inner.class");
    const CONSTANTS_ANONYMOUS: &[u8] = include_bytes!("fixtures/Constants$1.class");
    const HIDDEN: &[u8] = include_bytes!("fixtures/Hidden.class");

    #[test]
    fn compiled_classes_match_javap_flags() {
        // Long, Double, MethodHandle, MethodType and InvokeDynamic entries.
        assert!(is_public_class(CONSTANTS).unwrap());
        // 0x0021
        assert!(is_public_class(CONSTANTS_INNER).unwrap());
        // 0x0020
        assert!(!is_public_class(CONSTANTS_ANONYMOUS).unwrap());
        assert!(!is_public_class(HIDDEN).unwrap());
    }

    #[test]
    fn compiled_class_cut_short_is_truncated() {
        let cut = &CONSTANTS[..CONSTANTS.len() / 2];
        assert!(matches!(
            is_public_class(cut),
            Err(ClassFormatError::Truncated { .. })
        ));
    }

    #[test]
    fn public_class_is_detected() {
        let bytes = ClassFileBuilder::new()
            .utf8("com/foo/Baz")
            .class_ref(1)
            .utf8("java/lang/Object")
            .class_ref(3)
            .access(0x0021)
            .build();
        assert!(is_public_class(bytes.as_slice()).unwrap());
    }

    #[test]
    fn package_private_class_is_not_public() {
        let bytes = ClassFileBuilder::new()
            .utf8("com/foo/Hidden")
            .class_ref(1)
            .access(0x0020)
            .build();
        assert!(!is_public_class(bytes.as_slice()).unwrap());
    }

    #[test]
    fn long_entry_consumes_two_slots() {
        // count = 4: slot 1-2 Long, slot 3 Utf8.
        let bytes = ClassFileBuilder::new()
            .long(0x0102_0304_0506_0708)
            .utf8("x")
            .access(ACC_PUBLIC)
            .build();
        assert_eq!(u16::from_be_bytes([bytes[8], bytes[9]]), 4);
        assert!(is_public_class(bytes.as_slice()).unwrap());
    }

    #[test]
    fn double_entry_consumes_two_slots() {
        let bytes = ClassFileBuilder::new()
            .utf8("a")
            .double(2.5)
            .utf8("b")
            .access(0)
            .build();
        assert!(!is_public_class(bytes.as_slice()).unwrap());
    }

    #[test]
    fn every_fixed_width_tag_is_skipped() {
        let bytes = ClassFileBuilder::new()
            .utf8("com/foo/All")
            .raw(3, &[0, 0, 0, 7], 1)
            .raw(4, &[0x3f, 0x80, 0, 0], 1)
            .class_ref(1)
            .raw(8, &[0, 1], 1)
            .raw(9, &[0, 4, 0, 1], 1)
            .raw(10, &[0, 4, 0, 1], 1)
            .raw(11, &[0, 4, 0, 1], 1)
            .raw(12, &[0, 1, 0, 1], 1)
            .raw(15, &[1, 0, 6], 1)
            .raw(16, &[0, 1], 1)
            .raw(17, &[0, 0, 0, 9], 1)
            .raw(18, &[0, 0, 0, 9], 1)
            .raw(19, &[0, 1], 1)
            .raw(20, &[0, 1], 1)
            .access(ACC_PUBLIC)
            .build();
        assert!(is_public_class(bytes.as_slice()).unwrap());
    }

    #[test]
    fn unknown_tag_reports_tag_and_index() {
        let bytes = ClassFileBuilder::new()
            .utf8("ok")
            .raw(2, &[0, 0], 1)
            .access(ACC_PUBLIC)
            .build();
        let err = is_public_class(bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            ClassFormatError::UnknownConstantTag { tag: 2, index: 2 }
        ));
    }

    #[test]
    fn truncated_pool_fails() {
        let bytes = ClassFileBuilder::new()
            .utf8("com/foo/Truncated")
            .access(ACC_PUBLIC)
            .build();
        let err = is_public_class(&bytes[..14]).unwrap_err();
        assert!(matches!(err, ClassFormatError::Truncated { .. }));
    }

    #[test]
    fn truncated_header_fails() {
        let err = is_public_class(&[0xCA, 0xFE, 0xBA][..]).unwrap_err();
        assert!(matches!(
            err,
            ClassFormatError::Truncated { needed: 5, offset: 3 }
        ));
    }

    #[test]
    fn missing_access_flags_fails() {
        let mut bytes = ClassFileBuilder::new().utf8("a").access(ACC_PUBLIC).build();
        // Header, count, one Utf8 entry, then only one byte of access_flags.
        bytes.truncate(8 + 2 + 4 + 1);
        assert!(matches!(
            is_public_class(bytes.as_slice()).unwrap_err(),
            ClassFormatError::Truncated { needed: 2, .. }
        ));
    }

    #[test]
    fn empty_pool_reads_flags_directly() {
        let bytes = ClassFileBuilder::new().access(ACC_PUBLIC).build();
        assert!(is_public_class(bytes.as_slice()).unwrap());
    }
}
