use std::cmp::Ordering;
use std::env;
use std::process::Command;

// Lane-vector backends the kernels can be compiled against
#[derive(PartialEq, Eq, Debug)]
struct CpuFeature {
    name: &'static str,
    // spellings of the feature in /proc/cpuinfo or sysctl output
    aliases: &'static [&'static str],
    cfg_flag: &'static str,
    target_arches: &'static [&'static str],
    detected: bool,
}

impl CpuFeature {
    // Lowest number == highest priority
    fn priority(&self) -> usize {
        match self.name {
            "avx2" => 0,
            "sse4_1" => 1,
            "neon" => 2,
            _ => usize::MAX,
        }
    }

    // No AVX-512 entry: 16 lanes times two column groups does not divide the
    // 48 wide register tile.
    fn features() -> Vec<CpuFeature> {
        vec![
            CpuFeature {
                name: "sse4_1",
                aliases: &["sse4_1", "hw.optional.sse4_1: 1"],
                cfg_flag: "sse",
                target_arches: &["x86", "x86_64"],
                detected: false,
            },
            CpuFeature {
                name: "avx2",
                aliases: &["avx2", "hw.optional.avx2_0: 1"],
                cfg_flag: "avx2",
                target_arches: &["x86", "x86_64"],
                detected: false,
            },
            CpuFeature {
                name: "neon",
                aliases: &["asimd", "neon", "hw.optional.neon: 1"],
                cfg_flag: "neon",
                target_arches: &["aarch64"],
                detected: false,
            },
        ]
    }

    fn matches(&self, contents: &str) -> bool {
        self.aliases.iter().any(|alias| contents.contains(alias))
    }
}

impl Ord for CpuFeature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for CpuFeature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

trait CpuFeatureDetector {
    fn detect_features(&self, features: &mut [CpuFeature]);
    fn is_applicable(&self) -> bool;
}

struct LinuxDetector;
impl CpuFeatureDetector for LinuxDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
            let contents = cpuinfo.to_lowercase();
            for feature in features.iter_mut() {
                feature.detected = feature.matches(&contents);
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "linux")
    }
}

struct MacOSDetector;
impl CpuFeatureDetector for MacOSDetector {
    fn detect_features(&self, features: &mut [CpuFeature]) {
        let output = Command::new("sysctl").args(["-a"]).output();

        if let Ok(output) = output {
            let contents = String::from_utf8_lossy(&output.stdout).to_lowercase();
            for feature in features.iter_mut() {
                feature.detected = feature.matches(&contents);
            }
        }
    }

    fn is_applicable(&self) -> bool {
        cfg!(target_os = "macos")
    }
}

struct PlatformDetector;
impl PlatformDetector {
    fn cpu_features_detectors() -> Vec<Box<dyn CpuFeatureDetector>> {
        vec![Box::new(LinuxDetector), Box::new(MacOSDetector)]
    }

    fn detect_cpu_features(features: &mut [CpuFeature]) {
        for detector in Self::cpu_features_detectors() {
            if detector.is_applicable() {
                detector.detect_features(features);
                break;
            }
        }
    }

    fn apply(features: &mut [CpuFeature], target_arch: &str) {
        features.sort();

        // The highest priority feature usable on the target wins, otherwise
        // the kernels run on the portable lane vector.
        let cfg_flag = features
            .iter()
            .find(|feature| feature.detected && feature.target_arches.contains(&target_arch))
            .map(|feature| feature.cfg_flag)
            .unwrap_or("fallback");

        println!("cargo:rustc-cfg={cfg_flag}");

        println!("cargo::rustc-check-cfg=cfg(avx2)");
        println!("cargo::rustc-check-cfg=cfg(sse)");
        println!("cargo::rustc-check-cfg=cfg(neon)");
        println!("cargo::rustc-check-cfg=cfg(fallback)");
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let mut features = CpuFeature::features();

    let host = env::var("HOST").unwrap_or_default();
    let target = env::var("TARGET").unwrap_or_default();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    // Probing the build machine only says something about the target when
    // they are the same machine.
    if host == target {
        PlatformDetector::detect_cpu_features(&mut features);
    }

    PlatformDetector::apply(&mut features, &target_arch);
}
