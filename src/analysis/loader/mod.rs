//! Binary Loader Module
//!
//! Parses PE/ELF/Mach-O executables using goblin so their memory can be
//! examined without a live process:
//! - Sections mapped by virtual address
//! - Function and data symbols
//! - Byte order from the file header

use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

use crate::core::memory::{MemoryError, MemorySource};
use crate::examine::Endianness;

/// A named address in the binary
#[derive(Debug, Clone)]
pub struct SymbolInfo {
    /// Symbol name
    pub name: String,
    /// Virtual address
    pub address: u64,
    /// Size in bytes (0 if unknown)
    pub size: u64,
}

/// Information about a section in the binary
#[derive(Debug, Clone)]
pub struct SectionInfo {
    /// Section name
    pub name: String,
    /// Virtual address
    pub virtual_address: u64,
    /// Size in memory
    pub virtual_size: u64,
    /// Offset in file
    pub file_offset: u64,
    /// Size in file; the rest of `virtual_size` reads as zeros
    pub file_size: u64,
}

impl SectionInfo {
    fn contains(&self, address: u64) -> bool {
        address >= self.virtual_address && address - self.virtual_address < self.virtual_size
    }
}

/// Parsed binary image
#[derive(Debug)]
pub struct LoadedBinary {
    /// Original file path
    pub path: String,
    /// Raw bytes of the file
    pub data: Vec<u8>,
    /// Byte order declared by the header; `None` for raw images
    pub endianness: Option<Endianness>,
    /// Entry point address
    pub entry_point: u64,
    /// Symbols sorted by address
    pub symbols: Vec<SymbolInfo>,
    /// All mapped sections
    pub sections: Vec<SectionInfo>,
    /// Is this a 64-bit binary?
    pub is_64bit: bool,
    /// Binary format (PE, ELF, Mach-O, raw)
    pub format: String,
}

impl LoadedBinary {
    /// Load and parse a binary file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let data = fs::read(&path)?;
        let binary = Self::from_bytes(data, path_str)?;
        log::info!("Loaded {} ({})", binary.path, binary.format);
        Ok(binary)
    }

    /// Load a file as a flat memory image starting at `base`
    pub fn raw_from_file<P: AsRef<Path>>(path: P, base: u64) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let data = fs::read(&path)?;
        log::info!("Loaded raw image {} at {:#x}", path_str, base);
        Ok(Self::raw(data, path_str, base))
    }

    /// Flat image: one section covering the whole buffer, no known byte order
    pub fn raw(data: Vec<u8>, path: String, base: u64) -> Self {
        let len = data.len() as u64;
        Self {
            path,
            data,
            endianness: None,
            entry_point: base,
            symbols: Vec::new(),
            sections: vec![SectionInfo {
                name: "raw".into(),
                virtual_address: base,
                virtual_size: len,
                file_offset: 0,
                file_size: len,
            }],
            is_64bit: false,
            format: "raw".into(),
        }
    }

    /// Parse binary from bytes
    pub fn from_bytes(data: Vec<u8>, path: String) -> Result<Self> {
        // Check magic bytes to determine format
        if data.len() < 4 {
            return Err(anyhow!("File too small"));
        }

        // Check for PE (MZ header)
        if data[0] == 0x4D && data[1] == 0x5A {
            return Self::parse_pe(data, path);
        }

        // Check for ELF
        if data[0..4] == [0x7F, b'E', b'L', b'F'] {
            return Self::parse_elf(data, path);
        }

        // Check for Mach-O
        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic == 0xFEEDFACE || magic == 0xFEEDFACF || magic == 0xCEFAEDFE || magic == 0xCFFAEDFE {
            return Self::parse_macho(data, path);
        }

        Err(anyhow!("Unknown binary format (use `raw` for flat images)"))
    }

    /// Parse PE (Windows executable)
    fn parse_pe(data: Vec<u8>, path: String) -> Result<Self> {
        let pe = goblin::pe::PE::parse(&data)?;
        let image_base = pe.image_base as u64;
        let rebase = |rva: u64| image_base.checked_add(rva);

        let sections = pe
            .sections
            .iter()
            .map(|section| {
                let name = String::from_utf8_lossy(&section.name)
                    .trim_end_matches('\0')
                    .to_string();
                let virtual_address = rebase(section.virtual_address as u64).ok_or_else(|| {
                    anyhow!("section {} lies beyond the address space", name)
                })?;
                Ok(SectionInfo {
                    name,
                    virtual_address,
                    virtual_size: (section.virtual_size as u64)
                        .max(section.size_of_raw_data as u64),
                    file_offset: section.pointer_to_raw_data as u64,
                    file_size: section.size_of_raw_data as u64,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let symbols = pe
            .exports
            .iter()
            .filter_map(|export| {
                let address = rebase(export.rva as u64)?;
                export.name.map(|name| SymbolInfo {
                    name: name.to_string(),
                    address,
                    size: export.size as u64,
                })
            })
            .collect();

        let entry_point = rebase(pe.entry as u64)
            .ok_or_else(|| anyhow!("entry point lies beyond the address space"))?;

        Ok(Self {
            is_64bit: pe.is_64,
            entry_point,
            endianness: Some(Endianness::Little),
            symbols: sorted(symbols),
            sections,
            path,
            data,
            format: "PE".to_string(),
        })
    }

    /// Parse ELF (Linux executable)
    fn parse_elf(data: Vec<u8>, path: String) -> Result<Self> {
        use goblin::elf::program_header::PT_LOAD;
        use goblin::elf::section_header::{SHF_ALLOC, SHT_NOBITS};
        use goblin::elf::sym::{STT_FUNC, STT_OBJECT};

        let elf = goblin::elf::Elf::parse(&data)?;

        let mut sections = Vec::new();
        for section in &elf.section_headers {
            if section.sh_flags & SHF_ALLOC as u64 == 0 {
                continue;
            }
            let name = elf.shdr_strtab.get_at(section.sh_name).unwrap_or("").to_string();
            let file_size = if section.sh_type == SHT_NOBITS { 0 } else { section.sh_size };
            sections.push(SectionInfo {
                name,
                virtual_address: section.sh_addr,
                virtual_size: section.sh_size,
                file_offset: section.sh_offset,
                file_size,
            });
        }

        // Stripped binaries still have loadable segments
        if sections.is_empty() {
            for (i, ph) in elf.program_headers.iter().enumerate() {
                if ph.p_type == PT_LOAD {
                    sections.push(SectionInfo {
                        name: format!("LOAD{}", i),
                        virtual_address: ph.p_vaddr,
                        virtual_size: ph.p_memsz,
                        file_offset: ph.p_offset,
                        file_size: ph.p_filesz,
                    });
                }
            }
        }

        let mut symbols = Vec::new();
        let tables = [(&elf.syms, &elf.strtab), (&elf.dynsyms, &elf.dynstrtab)];
        for (syms, strtab) in tables {
            for sym in syms.iter() {
                let kind = sym.st_type();
                if (kind != STT_FUNC && kind != STT_OBJECT) || sym.st_value == 0 {
                    continue;
                }
                let name = strtab.get_at(sym.st_name).unwrap_or("");
                if name.is_empty() {
                    continue;
                }
                symbols.push(SymbolInfo {
                    name: name.to_string(),
                    address: sym.st_value,
                    size: sym.st_size,
                });
            }
        }

        let endianness = if elf.little_endian {
            Endianness::Little
        } else {
            Endianness::Big
        };

        Ok(Self {
            is_64bit: elf.is_64,
            entry_point: elf.entry,
            endianness: Some(endianness),
            symbols: sorted(symbols),
            sections,
            path,
            data,
            format: "ELF".to_string(),
        })
    }

    /// Parse Mach-O (macOS executable)
    fn parse_macho(data: Vec<u8>, path: String) -> Result<Self> {
        let mach = goblin::mach::Mach::parse(&data)?;

        match mach {
            goblin::mach::Mach::Binary(macho) => {
                let mut sections = Vec::new();
                for segment in &macho.segments {
                    let name = segment.name().unwrap_or("").to_string();
                    sections.push(SectionInfo {
                        name,
                        virtual_address: segment.vmaddr,
                        virtual_size: segment.vmsize,
                        file_offset: segment.fileoff,
                        file_size: segment.filesize,
                    });
                }

                let mut symbols = Vec::new();
                if let Some(syms) = &macho.symbols {
                    for (name, nlist) in syms.iter().flatten() {
                        if nlist.n_value != 0 && !nlist.is_undefined() && !name.is_empty() {
                            symbols.push(SymbolInfo {
                                name: name.to_string(),
                                address: nlist.n_value,
                                size: 0,
                            });
                        }
                    }
                }

                let endianness = if macho.little_endian {
                    Endianness::Little
                } else {
                    Endianness::Big
                };

                Ok(Self {
                    is_64bit: macho.is_64,
                    entry_point: macho.entry,
                    endianness: Some(endianness),
                    symbols: sorted(symbols),
                    sections,
                    path,
                    data,
                    format: "Mach-O".to_string(),
                })
            }
            goblin::mach::Mach::Fat(_) => Err(anyhow!("Fat Mach-O binaries not yet supported")),
        }
    }

    /// Find a symbol by name
    pub fn find_symbol(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Closest symbol at or below `address` that still covers it
    pub fn symbol_at(&self, address: u64) -> Option<&SymbolInfo> {
        self.symbols
            .iter()
            .take_while(|s| s.address <= address)
            .filter(|s| s.size == 0 || address - s.address < s.size)
            .last()
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let order = self
            .endianness
            .map(|e| format!("{}-endian", e))
            .unwrap_or_else(|| "unknown byte order".into());
        format!(
            "{} {} binary ({})\n\
             Entry: 0x{:x}\n\
             Sections: {}\n\
             Symbols: {}",
            if self.is_64bit { "64-bit" } else { "32-bit" },
            self.format,
            order,
            self.entry_point,
            self.sections.len(),
            self.symbols.len()
        )
    }
}

fn sorted(mut symbols: Vec<SymbolInfo>) -> Vec<SymbolInfo> {
    symbols.sort_by_key(|s| s.address);
    symbols.dedup_by_key(|s| s.address);
    symbols
}

impl MemorySource for LoadedBinary {
    fn read(&self, address: u64, size: usize) -> Result<Vec<u8>, MemoryError> {
        let past_end = |section: &SectionInfo| MemoryError::ReadFailed {
            address,
            reason: format!("section {} extends past end of file", section.name),
        };

        let section = self
            .sections
            .iter()
            .find(|s| s.contains(address))
            .ok_or(MemoryError::Unmapped { address })?;

        let offset = address - section.virtual_address;
        let available = section.virtual_size - offset;
        if (size as u64) > available {
            return Err(MemoryError::Unmapped {
                address: address.saturating_add(available),
            });
        }

        let mut out = Vec::new();
        out.try_reserve_exact(size)
            .map_err(|e| MemoryError::ReadFailed {
                address,
                reason: e.to_string(),
            })?;
        out.resize(size, 0);

        if offset < section.file_size {
            let in_file = (section.file_size - offset).min(size as u64) as usize;
            let start = section
                .file_offset
                .checked_add(offset)
                .and_then(|start| usize::try_from(start).ok())
                .ok_or_else(|| past_end(section))?;
            let end = start.checked_add(in_file).ok_or_else(|| past_end(section))?;
            let bytes = self.data.get(start..end).ok_or_else(|| past_end(section))?;
            out[..in_file].copy_from_slice(bytes);
        }

        Ok(out)
    }

    fn resolve_symbol(&self, name: &str) -> Option<u64> {
        self.find_symbol(name).map(|s| s.address)
    }

    fn symbolize(&self, address: u64) -> Option<String> {
        self.symbol_at(address).map(|s| match address - s.address {
            0 => s.name.clone(),
            off => format!("{}+{}", s.name, off),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_self() {
        // Parse the test executable itself
        let exe_path = std::env::current_exe().unwrap();
        let result = LoadedBinary::from_file(&exe_path);

        if let Ok(binary) = result {
            println!("{}", binary.summary());
            assert_eq!(binary.endianness, Some(Endianness::host()));
            assert!(!binary.sections.is_empty());
        } else {
            println!("Could not parse self: {:?}", result);
        }
    }

    #[test]
    fn test_raw_image() {
        let mut image = LoadedBinary::raw((0u8..16).collect(), "blob".into(), 0x2000);
        image.symbols = vec![SymbolInfo {
            name: "table".into(),
            address: 0x2004,
            size: 8,
        }];

        assert_eq!(image.endianness, None);
        assert_eq!(image.read(0x2004, 4).unwrap(), vec![4, 5, 6, 7]);
        assert_eq!(image.resolve_symbol("table"), Some(0x2004));
        assert_eq!(image.symbolize(0x2006).as_deref(), Some("table+2"));
        assert_eq!(image.symbolize(0x200c), None);
        assert_eq!(image.symbolize(0x2000), None);
    }

    #[test]
    fn test_raw_image_bounds() {
        let image = LoadedBinary::raw(vec![0xaa; 8], "blob".into(), 0x100);
        assert!(matches!(
            image.read(0x104, 8),
            Err(MemoryError::Unmapped { address: 0x108 })
        ));
        assert!(matches!(image.read(0xff, 1), Err(MemoryError::Unmapped { .. })));
    }

    #[test]
    fn test_zero_fill_past_file_data() {
        let mut image = LoadedBinary::raw(vec![1, 2, 3, 4], "bss".into(), 0);
        image.sections[0].virtual_size = 8;
        assert_eq!(image.read(2, 4).unwrap(), vec![3, 4, 0, 0]);
    }

    #[test]
    fn test_file_offset_overflow() {
        let mut image = LoadedBinary::raw(vec![0xaa; 8], "bogus".into(), 0x100);
        image.sections[0].file_offset = u64::MAX - 1;

        assert!(matches!(
            image.read(0x100, 4),
            Err(MemoryError::ReadFailed { address: 0x100, .. })
        ));
    }

    #[test]
    fn test_unknown_format() {
        assert!(LoadedBinary::from_bytes(vec![0; 64], "zeros".into()).is_err());
    }
}
