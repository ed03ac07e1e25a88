//! Machine size and image tables.

/// Size used when a flavor or instance type is not in the table.
pub const DEFAULT_VM_SIZE: &str = "Standard_A1";

const VM_SIZES: &[(&str, &str)] = &[
    ("m1.tiny", "Standard_A0"),
    ("t1.micro", "Standard_A0"),
    ("t2.micro", "Standard_A0"),
    ("t2.small", "Standard_A1"),
    ("m1.small", "Standard_A1"),
    ("t2.medium", "Standard_A2"),
    ("m1.medium", "Standard_A2"),
    ("m3.medium", "Standard_A2"),
    ("m1.large", "Standard_A3"),
    ("m3.large", "Standard_A3"),
    ("m1.xlarge", "Standard_A4"),
    ("m3.xlarge", "Standard_A4"),
];

/// The target machine size for a source flavor or instance type.
pub fn vm_size(flavor: &str) -> &'static str {
    match VM_SIZES.iter().find(|(source, _)| *source == flavor) {
        Some((_, size)) => size,
        None => {
            log::warn!("no machine size for '{flavor}', using {DEFAULT_VM_SIZE}");
            DEFAULT_VM_SIZE
        }
    }
}

/// A marketplace image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReference {
    pub publisher: &'static str,
    pub offer: &'static str,
    pub sku: &'static str,
}

pub const UBUNTU: ImageReference = ImageReference {
    publisher: "Canonical",
    offer: "UbuntuServer",
    sku: "14.04.2-LTS",
};

pub const WINDOWS: ImageReference = ImageReference {
    publisher: "MicrosoftWindowsServer",
    offer: "WindowsServer",
    sku: "2012-R2-Datacenter",
};

pub const CENTOS: ImageReference = ImageReference {
    publisher: "OpenLogic",
    offer: "CentOS",
    sku: "7.1",
};

/// The closest marketplace image for a source image name.
///
/// Matching is by distribution keyword; anything unrecognised becomes
/// Ubuntu.
pub fn image_reference(image: &str) -> ImageReference {
    let image = image.to_ascii_lowercase();
    if image.contains("windows") {
        WINDOWS
    } else if image.contains("centos") || image.contains("fedora") {
        CENTOS
    } else {
        if !image.contains("ubuntu") {
            log::warn!("no image mapping for '{image}', using Ubuntu");
        }
        UBUNTU
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_flavors_map_to_sizes() {
        assert_eq!(vm_size("m1.tiny"), "Standard_A0");
        assert_eq!(vm_size("m1.xlarge"), "Standard_A4");
        assert_eq!(vm_size("c9.huge"), DEFAULT_VM_SIZE);
    }

    #[test]
    fn images_match_by_keyword() {
        assert_eq!(image_reference("Windows Server 2012 R2"), WINDOWS);
        assert_eq!(image_reference("centos-fedora-F17"), CENTOS);
        assert_eq!(image_reference("ubuntu-14.04"), UBUNTU);
        assert_eq!(image_reference("ami-1234"), UBUNTU);
    }
}
