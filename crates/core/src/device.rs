use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::ToolError;
use crate::model::PhysicalDisk;
use crate::tools::BlockDevices;

type Matcher = fn(&str) -> Option<PhysicalDisk>;

pub const MATCHERS: &[(&str, Matcher)] = &[
    ("nvme", match_nvme as Matcher),
    ("letter+digit", match_letter_digit as Matcher),
    ("whole-disk scsi", match_whole_scsi as Matcher),
];

static NVME_PARTITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/dev/nvme\d+n\d+)p(\d+)$").expect("valid nvme partition regex")
});
static LETTER_DIGIT_PARTITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/dev/[a-z]+)(\d+)$").expect("valid partition regex"));
static WHOLE_SCSI_DISK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/dev/sd[a-z]+$").expect("valid scsi disk regex"));
static TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("valid trailing digits regex"));

fn split_partition(re: &Regex, device: &str) -> Option<PhysicalDisk> {
    let captures = re.captures(device)?;
    // Partitions are numbered from 1; `md0` or `loop0` are whole devices.
    let partition = captures
        .get(2)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|number| *number > 0)?;
    Some(PhysicalDisk::partitioned(captures.get(1)?.as_str(), partition))
}

pub fn match_nvme(device: &str) -> Option<PhysicalDisk> {
    split_partition(&NVME_PARTITION, device)
}

pub fn match_letter_digit(device: &str) -> Option<PhysicalDisk> {
    split_partition(&LETTER_DIGIT_PARTITION, device)
}

pub fn match_whole_scsi(device: &str) -> Option<PhysicalDisk> {
    WHOLE_SCSI_DISK
        .is_match(device)
        .then(|| PhysicalDisk::whole(device))
}

pub fn match_device_path(device: &str) -> Option<PhysicalDisk> {
    MATCHERS.iter().find_map(|(name, matcher)| {
        let found = matcher(device);
        if found.is_some() {
            debug!(device, convention = *name, "device path matched");
        }
        found
    })
}

#[derive(Debug)]
pub enum DiskResolution {
    Resolved(PhysicalDisk),
    Ambiguous(Vec<String>),
    Unknown,
}

pub fn resolve_physical_disk(
    block: &BlockDevices<'_>,
    device: &str,
) -> Result<DiskResolution, ToolError> {
    if let Some(disk) = match_device_path(device) {
        return Ok(DiskResolution::Resolved(disk));
    }

    let parents = block.parents(device)?;
    match parents.as_slice() {
        [parent] => {
            let disk = format!("/dev/{parent}");
            let partition = if block.device_type(device)? == "part" {
                TRAILING_DIGITS
                    .captures(device)
                    .and_then(|captures| captures.get(1))
                    .and_then(|digits| digits.as_str().parse().ok())
            } else {
                None
            };
            Ok(DiskResolution::Resolved(PhysicalDisk {
                disk,
                partition,
            }))
        }
        [] => {
            if block.device_type(device)? == "disk" {
                Ok(DiskResolution::Resolved(PhysicalDisk::whole(device)))
            } else {
                Ok(DiskResolution::Unknown)
            }
        }
        _ => Ok(DiskResolution::Ambiguous(parents)),
    }
}

#[cfg(test)]
mod tests {
    use super::{match_device_path, match_letter_digit, match_nvme, match_whole_scsi};
    use crate::model::PhysicalDisk;

    #[test]
    fn resolves_documented_conventions() {
        assert_eq!(
            match_device_path("/dev/nvme0n1p3"),
            Some(PhysicalDisk::partitioned("/dev/nvme0n1", 3))
        );
        assert_eq!(
            match_device_path("/dev/sdb1"),
            Some(PhysicalDisk::partitioned("/dev/sdb", 1))
        );
        assert_eq!(
            match_device_path("/dev/sdb"),
            Some(PhysicalDisk::whole("/dev/sdb"))
        );
    }

    #[test]
    fn virtio_and_xen_partitions_use_letter_digit_rule() {
        assert_eq!(
            match_device_path("/dev/vda2"),
            Some(PhysicalDisk::partitioned("/dev/vda", 2))
        );
        assert_eq!(
            match_device_path("/dev/xvda15"),
            Some(PhysicalDisk::partitioned("/dev/xvda", 15))
        );
    }

    #[test]
    fn nvme_takes_precedence_and_is_not_split_as_letter_digit() {
        assert!(match_letter_digit("/dev/nvme0n1p3").is_none());
        assert!(match_nvme("/dev/nvme0n1").is_none());
        assert!(match_whole_scsi("/dev/sdb1").is_none());
    }

    #[test]
    fn unconventional_names_fall_through() {
        assert_eq!(match_device_path("/dev/mmcblk0p2"), None);
        assert_eq!(match_device_path("/dev/vdb"), None);
        assert_eq!(match_device_path("/dev/mapper/mpatha"), None);
    }

    #[test]
    fn index_zero_devices_are_not_partitions() {
        assert_eq!(match_letter_digit("/dev/md0"), None);
        assert_eq!(match_letter_digit("/dev/loop0"), None);
        assert_eq!(match_nvme("/dev/nvme0n1p0"), None);
        assert_eq!(
            match_letter_digit("/dev/vda10"),
            Some(PhysicalDisk::partitioned("/dev/vda", 10))
        );
    }
}
