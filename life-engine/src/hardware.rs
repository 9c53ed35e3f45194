// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Hardware concurrency detection
//!
//! The worker pool is sized from the number of logical processors. Detection
//! goes through the standard library first and falls back to CPUID on x86_64.
//! When both fail the pool uses [`MIN_WORKER_THREADS`].

use std::sync::OnceLock;

/// Floor applied when the processor count cannot be determined
pub const MIN_WORKER_THREADS: usize = 4;

/// Where the detected value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencySource {
    /// `std::thread::available_parallelism`
    Os,
    /// CPUID leaf 1 logical processor count
    Cpuid,
    /// Nothing worked, the floor was used
    Fallback,
}

/// Result of hardware concurrency detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency {
    /// Number of logical processors
    pub threads: usize,
    /// How the number was obtained
    pub source: ConcurrencySource,
}

static CONCURRENCY: OnceLock<Concurrency> = OnceLock::new();

/// Detect the number of logical processors
///
/// The result is cached for the lifetime of the process.
pub fn detect_concurrency() -> Concurrency {
    *CONCURRENCY.get_or_init(detect_concurrency_impl)
}

/// Number of worker threads to use by default
pub fn default_thread_count() -> usize {
    detect_concurrency().threads
}

fn detect_concurrency_impl() -> Concurrency {
    match std::thread::available_parallelism() {
        Ok(n) => Concurrency {
            threads: n.get(),
            source: ConcurrencySource::Os,
        },
        Err(err) => {
            log::warn!("Cannot query available parallelism ({err}), trying CPUID");
            match cpuid_logical_processors() {
                Some(threads) => Concurrency {
                    threads,
                    source: ConcurrencySource::Cpuid,
                },
                None => {
                    log::warn!(
                        "Cannot detect number of CPUs, using {} worker threads",
                        MIN_WORKER_THREADS
                    );
                    Concurrency {
                        threads: MIN_WORKER_THREADS,
                        source: ConcurrencySource::Fallback,
                    }
                }
            }
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn cpuid_logical_processors() -> Option<usize> {
    use raw_cpuid::CpuId;

    let cpuid = CpuId::new();
    let count = cpuid.get_feature_info()?.max_logical_processor_ids() as usize;
    (count > 0).then_some(count)
}

#[cfg(not(target_arch = "x86_64"))]
fn cpuid_logical_processors() -> Option<usize> {
    None
}
