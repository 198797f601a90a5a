//! One listing cycle: open every selected table, decode, filter, suppress
//! duplicates and print.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::correlate::{ProcessCache, ScanStatus};
use crate::decode::{Decoded, Decoder};
use crate::dedup::SeenIndex;
use crate::error::{NetstatError, Result};
use crate::filter::SocketFilter;
use crate::model::{AddressFamily, Protocol, Record};
use crate::output::OutputFormatter;
use crate::reader::RecordReader;
use crate::resolve::{NameDatabase, NameResolver};

/// A group of tables listed together and reported missing together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Tcp,
    Sctp,
    Udp,
    UdpLite,
    Raw,
    Igmp,
    Unix,
}

/// One kernel table and the decoder it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Table {
    file: &'static str,
    protocol: Protocol,
    /// `None` for tables that carry both families.
    family: Option<AddressFamily>,
}

const fn table(file: &'static str, protocol: Protocol, family: Option<AddressFamily>) -> Table {
    Table {
        file,
        protocol,
        family,
    }
}

const V4: Option<AddressFamily> = Some(AddressFamily::Ipv4);
const V6: Option<AddressFamily> = Some(AddressFamily::Ipv6);

impl Section {
    /// Listing order within a cycle.
    pub const ORDER: [Section; 7] = [
        Section::Tcp,
        Section::Sctp,
        Section::Udp,
        Section::UdpLite,
        Section::Raw,
        Section::Igmp,
        Section::Unix,
    ];

    fn tables(&self) -> &'static [Table] {
        const TCP: [Table; 2] = [table("tcp", Protocol::Tcp, V4), table("tcp6", Protocol::Tcp, V6)];
        const SCTP: [Table; 2] = [
            table("sctp/eps", Protocol::SctpEndpoint, None),
            table("sctp/assocs", Protocol::SctpAssociation, None),
        ];
        const UDP: [Table; 2] = [table("udp", Protocol::Udp, V4), table("udp6", Protocol::Udp, V6)];
        const UDPLITE: [Table; 2] = [
            table("udplite", Protocol::UdpLite, V4),
            table("udplite6", Protocol::UdpLite, V6),
        ];
        const RAW: [Table; 2] = [table("raw", Protocol::Raw, V4), table("raw6", Protocol::Raw, V6)];
        const IGMP: [Table; 2] = [
            table("igmp", Protocol::IgmpMembership, V4),
            table("igmp6", Protocol::IgmpMembership, V6),
        ];
        const UNIX: [Table; 1] = [table("unix", Protocol::Unix, None)];

        match self {
            Section::Tcp => &TCP,
            Section::Sctp => &SCTP,
            Section::Udp => &UDP,
            Section::UdpLite => &UDPLITE,
            Section::Raw => &RAW,
            Section::Igmp => &IGMP,
            Section::Unix => &UNIX,
        }
    }

    /// Name used in the "no support" notice.
    pub fn family_name(&self) -> &'static str {
        match self {
            Section::Tcp => "AF INET (tcp)",
            Section::Sctp => "AF INET (sctp)",
            Section::Udp => "AF INET (udp)",
            Section::UdpLite => "AF INET (udplite)",
            Section::Raw => "AF INET (raw)",
            Section::Igmp => "AF INET (igmp)",
            Section::Unix => "AF UNIX",
        }
    }

    fn selected(&self, config: &Config) -> bool {
        let p = &config.protocols;
        match self {
            Section::Tcp => p.tcp,
            Section::Sctp => p.sctp,
            Section::Udp => p.udp,
            Section::UdpLite => p.udplite,
            Section::Raw => p.raw,
            Section::Igmp => p.igmp,
            Section::Unix => p.unix,
        }
    }
}

/// Records of one section, or `Missing` when none of its tables exist.
#[derive(Debug, PartialEq, Eq)]
pub enum Source {
    Missing,
    Records(Vec<Record>),
}

/// Result of reading one section. A table that fails to open does not
/// discard what the other tables of the section produced.
#[derive(Debug)]
pub struct SectionScan {
    pub source: Source,
    pub failures: Vec<NetstatError>,
}

/// What happened during one cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Tables that could not be opened.
    pub failures: Vec<NetstatError>,
    /// Sections with no table on this system.
    pub missing: Vec<Section>,
    /// Missing sections the user asked for by name.
    pub unsupported: bool,
    pub rows: usize,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.unsupported
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

const PARTIAL_NOTICE: &str = "(Not all processes could be identified, non-owned process info\n \
     will not be shown, you would have to be root to see it all.)";

/// One-time message for a correlation walk that did not see everything.
fn correlation_notice(status: ScanStatus, euid: u32) -> Option<String> {
    match status {
        ScanStatus::Partial => Some(PARTIAL_NOTICE.to_string()),
        ScanStatus::Unreadable => Some(format!(
            "(No info could be read for \"-p\": geteuid()={} but you should be root.)",
            euid
        )),
        ScanStatus::Complete | ScanStatus::NotLoaded => None,
    }
}

/// Owns everything a cycle needs and is reused between cycles.
pub struct Scanner {
    config: Config,
    filter: SocketFilter,
    formatter: OutputFormatter,
    resolver: Box<dyn NameResolver>,
    cache: ProcessCache,
    seen: SeenIndex,
    /// The correlation notice has been considered this cycle.
    correlation_reported: bool,
    /// Sections already announced as unsupported.
    notified: HashSet<&'static str>,
}

impl Scanner {
    pub fn new(config: Config) -> Self {
        let resolver = Box::new(NameDatabase::new(
            config.etc_root.clone(),
            config.reverse_dns(),
        ));
        Self::with_resolver(config, resolver)
    }

    pub fn with_resolver(config: Config, resolver: Box<dyn NameResolver>) -> Self {
        Scanner {
            filter: config.filter(),
            formatter: OutputFormatter::from_config(&config),
            cache: ProcessCache::new(config.proc_root.clone(), config.labels),
            seen: SeenIndex::new(),
            correlation_reported: false,
            notified: HashSet::new(),
            resolver,
            config,
        }
    }

    fn table_path(&self, table: &Table) -> PathBuf {
        self.config.proc_root.join("net").join(table.file)
    }

    fn wants(&self, table: &Table) -> bool {
        table
            .family
            .map_or(true, |family| self.config.families.contains(family))
    }

    /// Decode, filter and deduplicate every selected table of `section`.
    ///
    /// Each table is its own pass: an open failure is recorded and the next
    /// table is still read.
    pub fn collect(&mut self, section: Section) -> SectionScan {
        let mut found = false;
        let mut records = Vec::new();
        let mut failures = Vec::new();

        let tables: Vec<Table> = section
            .tables()
            .iter()
            .copied()
            .filter(|t| self.wants(t))
            .collect();
        for table in &tables {
            let path = self.table_path(table);
            let reader = match RecordReader::open(&path) {
                Ok(Some(reader)) => reader,
                Ok(None) => {
                    tracing::debug!(path = %path.display(), "table not present");
                    continue;
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), "table open failed");
                    found = true;
                    failures.push(e);
                    continue;
                }
            };
            found = true;

            let mut decoder = Decoder::for_protocol(table.protocol);
            for (line_no, line) in reader {
                match decoder.decode(line_no, &line) {
                    Decoded::Record(record) => {
                        if !self.filter.matches(&record) {
                            continue;
                        }
                        if let Record::Socket(sock) = &record {
                            if !self.seen.admit(sock) {
                                continue;
                            }
                        }
                        records.push(record);
                    }
                    Decoded::Skip => {}
                    Decoded::Malformed(reason) => {
                        tracing::warn!(
                            path = %path.display(),
                            line = line_no + 1,
                            protocol = %table.protocol,
                            "{}",
                            reason
                        );
                    }
                }
            }
        }

        let source = if found {
            Source::Records(records)
        } else {
            Source::Missing
        };
        SectionScan { source, failures }
    }

    /// Walk the process table once per cycle and explain what is missing.
    fn ensure_correlation<E: Write>(&mut self, diag: &mut E) -> io::Result<()> {
        if !self.config.needs_correlation() || self.correlation_reported {
            return Ok(());
        }
        self.correlation_reported = true;
        let status = self.cache.build();
        if let Some(notice) = correlation_notice(status, nix::unistd::geteuid().as_raw()) {
            writeln!(diag, "{}", notice)?;
        }
        if self.cache.is_empty() {
            tracing::info!("no socket owners found");
        }
        Ok(())
    }

    fn note_missing<E: Write>(
        &mut self,
        section: Section,
        report: &mut CycleReport,
        diag: &mut E,
    ) -> io::Result<()> {
        report.missing.push(section);
        if self.config.explicit_protocols {
            report.unsupported = true;
        }
        if (self.config.verbose || self.config.explicit_protocols)
            && self.notified.insert(section.family_name())
        {
            writeln!(
                diag,
                "rnetstat: no support for `{}' on this system.",
                section.family_name()
            )?;
        }
        Ok(())
    }

    fn print_section<W: Write>(&self, records: &[Record], out: &mut W) -> io::Result<usize> {
        let mut rows = 0;
        for record in records {
            match record {
                Record::Socket(sock) => {
                    let resolver = self.resolver.as_ref();
                    for row in self.formatter.socket_rows(sock, resolver, &self.cache) {
                        writeln!(out, "{}", row)?;
                        rows += 1;
                    }
                }
                Record::Unix(sock) => {
                    writeln!(out, "{}", self.formatter.unix_row(sock, &self.cache))?;
                    rows += 1;
                }
            }
        }
        Ok(rows)
    }

    /// Forget everything the previous cycle learned.
    fn begin_cycle(&mut self) {
        self.seen.clear();
        self.cache.clear();
        self.correlation_reported = false;
    }

    /// Run one full listing into `out`, with notices going to `diag`.
    pub fn run_cycle<W: Write, E: Write>(
        &mut self,
        out: &mut W,
        diag: &mut E,
    ) -> Result<CycleReport> {
        self.begin_cycle();
        self.list(out, diag)
    }

    fn list<W: Write, E: Write>(&mut self, out: &mut W, diag: &mut E) -> Result<CycleReport> {
        let mut report = CycleReport::default();
        let stdout_error = |e| NetstatError::io("<stdout>", e);
        let stderr_error = |e| NetstatError::io("<stderr>", e);

        if self.config.protocols.any_inet() {
            self.ensure_correlation(diag).map_err(stderr_error)?;
            writeln!(out, "{}", self.formatter.inet_banner()).map_err(stdout_error)?;
        }

        for section in Section::ORDER {
            if !section.selected(&self.config) {
                continue;
            }
            match section {
                Section::Igmp => {
                    writeln!(out, "{}", self.formatter.igmp_banner()).map_err(stdout_error)?;
                }
                Section::Unix => {
                    self.ensure_correlation(diag).map_err(stderr_error)?;
                    writeln!(out, "{}", self.formatter.unix_banner()).map_err(stdout_error)?;
                }
                _ => {}
            }

            let scan = self.collect(section);
            match scan.source {
                Source::Records(records) => {
                    report.rows += self.print_section(&records, out).map_err(stdout_error)?;
                }
                Source::Missing => self
                    .note_missing(section, &mut report, diag)
                    .map_err(stderr_error)?,
            }
            report.failures.extend(scan.failures);
        }

        out.flush().map_err(stdout_error)?;
        tracing::debug!(
            tuples = self.seen.len(),
            owners = self.cache.len(),
            correlation = ?self.cache.status(),
            "cycle finished"
        );
        Ok(report)
    }
}
