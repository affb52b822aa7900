// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! Algorithm negotiation settings.
//!
//! Legacy mode restricts the offered key exchange and cipher lists to the
//! SHA-1/SHA-256 Diffie-Hellman groups and AES-CTR ciphers, which older
//! embedded sshd builds and network appliances still expect.

use russh::{cipher, kex, Preferred};
use std::borrow::Cow;

const LEGACY_KEX: &[kex::Name] = &[
    kex::DH_G14_SHA256,
    kex::DH_G14_SHA1,
    kex::DH_G1_SHA1,
    kex::EXTENSION_SUPPORT_AS_CLIENT,
];

const LEGACY_CIPHERS: &[cipher::Name] = &[cipher::AES_256_CTR, cipher::AES_128_CTR];

/// Algorithm preferences to offer during negotiation.
pub fn preferred(legacy: bool) -> Preferred {
    if legacy {
        Preferred {
            kex: Cow::Borrowed(LEGACY_KEX),
            cipher: Cow::Borrowed(LEGACY_CIPHERS),
            ..Preferred::default()
        }
    } else {
        Preferred::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences_untouched() {
        let default = Preferred::default();
        assert_eq!(preferred(false).kex, default.kex);
        assert_eq!(preferred(false).cipher, default.cipher);
    }

    #[test]
    fn test_legacy_preferences_are_narrowed() {
        let legacy = preferred(true);
        assert_eq!(legacy.kex.as_ref(), LEGACY_KEX);
        assert_eq!(legacy.cipher.as_ref(), LEGACY_CIPHERS);
        assert!(legacy.kex.contains(&kex::DH_G14_SHA1));
        assert!(!legacy.kex.contains(&kex::CURVE25519));
    }
}
