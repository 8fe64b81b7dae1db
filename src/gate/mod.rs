//! PIN screen in front of the journal.
//!
//! The gate keeps casual eyes off the journal on a shared machine. It is not
//! authentication: the PIN digest is a single unsalted BLAKE3 hash kept next to
//! the data it guards, and there is no rate limiting.
//!
//! State lives in two stores:
//!
//! - the durable store holds the PIN digest under `devotions-pin-hash`
//! - the session store holds `devotions-unlocked = "1"` while unlocked
//!
//! Each new session starts locked. With no PIN stored, every candidate is
//! rejected; a PIN is only created through [`Gate::set_pin`].

use crate::constants::{PIN_HASH_KEY, PIN_LENGTH, UNLOCKED_KEY, UNLOCKED_VALUE};
use crate::errors::{AppError, AppResult, GateError};
use crate::store::{KeyValueStore, StoreResult};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Hex digest stored for `pin`.
pub fn hash_pin(pin: &str) -> String {
    blake3::hash(pin.as_bytes()).to_hex().to_string()
}

/// Checks that `pin` is exactly six ASCII digits.
///
/// ```
/// use devotions::gate::validate_pin_format;
///
/// assert!(validate_pin_format("042917").is_ok());
/// assert!(validate_pin_format("12345").is_err());
/// assert!(validate_pin_format("12345a").is_err());
/// ```
pub fn validate_pin_format(pin: &str) -> Result<(), GateError> {
    if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(GateError::InvalidPinFormat)
    }
}

/// Lock state over a durable store `D` and a session store `S`.
pub struct Gate<D, S> {
    durable: D,
    session: S,
}

impl<D: KeyValueStore, S: KeyValueStore> Gate<D, S> {
    pub fn new(durable: D, session: S) -> Self {
        Gate { durable, session }
    }

    fn stored_hash(&self) -> Option<String> {
        match self.durable.get(PIN_HASH_KEY) {
            Ok(hash) => hash.filter(|h| !h.is_empty()),
            Err(e) => {
                warn!("Reading PIN digest failed: {}", e);
                None
            }
        }
    }

    fn mark_unlocked(&self) -> StoreResult<()> {
        self.session.set(UNLOCKED_KEY, UNLOCKED_VALUE)
    }

    pub fn has_pin_set(&self) -> bool {
        self.stored_hash().is_some()
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(
            self.session.get(UNLOCKED_KEY),
            Ok(Some(ref value)) if value == UNLOCKED_VALUE
        )
    }

    /// Compare `candidate` with the stored PIN and unlock on a match.
    ///
    /// # Errors
    ///
    /// - `GateError::NoPinSet` if no PIN has been stored
    /// - `GateError::InvalidPinFormat` if `candidate` is not six digits
    /// - `GateError::WrongPin` on mismatch
    /// - `StorageError` if the unlock flag cannot be recorded
    ///
    /// The state is unchanged on every error.
    pub fn unlock(&self, candidate: &str) -> AppResult<()> {
        let Some(stored) = self.stored_hash() else {
            debug!("No PIN set, rejecting");
            return Err(GateError::NoPinSet.into());
        };
        validate_pin_format(candidate)?;

        let candidate_hash = Zeroizing::new(hash_pin(candidate));
        if *candidate_hash != stored {
            info!("PIN rejected");
            return Err(GateError::WrongPin.into());
        }

        self.mark_unlocked()?;
        info!("Unlocked");
        Ok(())
    }

    /// [`Gate::unlock`] as a yes/no answer: `true` only once the session is
    /// actually unlocked.
    pub fn check_secret(&self, candidate: &str) -> bool {
        match self.unlock(candidate) {
            Ok(()) => true,
            Err(AppError::Storage(e)) => {
                warn!("Recording unlock failed: {}", e);
                false
            }
            Err(_) => false,
        }
    }

    /// Store a new PIN and unlock.
    ///
    /// Replacing an existing PIN requires an unlocked session.
    ///
    /// # Errors
    ///
    /// - `GateError::InvalidPinFormat` if `pin` is not six digits
    /// - `GateError::Locked` if a PIN exists and the session is locked
    /// - `StorageError` if the digest or the unlock flag cannot be written
    pub fn set_pin(&self, pin: &str) -> AppResult<()> {
        validate_pin_format(pin)?;
        if self.has_pin_set() && !self.is_unlocked() {
            return Err(GateError::Locked.into());
        }

        self.durable.set(PIN_HASH_KEY, &hash_pin(pin))?;
        self.mark_unlocked()?;
        info!("PIN set");
        Ok(())
    }

    /// Clear the unlock flag. Safe to call when already locked.
    pub fn lock(&self) {
        if let Err(e) = self.session.remove(UNLOCKED_KEY) {
            warn!("Clearing unlock flag failed: {}", e);
        }
        info!("Locked");
    }

    /// Fails with `GateError::Locked` unless unlocked; otherwise refreshes the
    /// session so the inactivity timeout restarts.
    pub fn require_unlocked(&self) -> AppResult<()> {
        if !self.is_unlocked() {
            return Err(GateError::Locked.into());
        }
        if let Err(e) = self.mark_unlocked() {
            warn!("Refreshing session failed: {}", e);
        }
        Ok(())
    }
}

/// Read a PIN from `DEVOTIONS_TEST_PIN` or prompt for it on the terminal.
///
/// The returned buffer is wiped on drop.
pub fn read_pin(prompt: &str) -> AppResult<Zeroizing<String>> {
    if let Ok(pin) = std::env::var(crate::constants::ENV_VAR_TEST_PIN) {
        debug!("Using DEVOTIONS_TEST_PIN for non-interactive use");
        return Ok(Zeroizing::new(pin));
    }

    let pin = rpassword::prompt_password(prompt)
        .map_err(|e| GateError::PinPrompt(e.to_string()))?;
    Ok(Zeroizing::new(pin.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;
    use crate::store::MemoryStore;

    /// Session store that can be read but never written.
    struct ReadOnlySession;

    impl KeyValueStore for ReadOnlySession {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StorageError::Unavailable("read-only session".to_string()))
        }

        fn remove(&self, _key: &str) -> StoreResult<()> {
            Ok(())
        }

        fn entries(&self) -> StoreResult<Vec<(String, String)>> {
            Ok(Vec::new())
        }
    }

    fn gate() -> Gate<MemoryStore, MemoryStore> {
        Gate::new(MemoryStore::new(), MemoryStore::new())
    }

    #[test]
    fn test_initially_locked_without_pin() {
        let gate = gate();
        assert!(!gate.is_unlocked());
        assert!(!gate.has_pin_set());
    }

    #[test]
    fn test_any_candidate_rejected_before_pin_is_set() {
        let gate = gate();
        assert!(!gate.check_secret("000000"));
        assert!(!gate.check_secret(""));
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn test_set_pin_unlocks_and_stores_digest() {
        let gate = gate();
        gate.set_pin("246810").unwrap();

        assert!(gate.is_unlocked());
        assert!(gate.has_pin_set());
        let stored = gate.durable.get(PIN_HASH_KEY).unwrap().unwrap();
        assert_eq!(stored, hash_pin("246810"));
        assert_ne!(stored, "246810");
    }

    #[test]
    fn test_lock_then_unlock_with_correct_pin() {
        let gate = gate();
        gate.set_pin("246810").unwrap();
        gate.lock();
        assert!(!gate.is_unlocked());

        assert!(gate.check_secret("246810"));
        assert!(gate.is_unlocked());
    }

    #[test]
    fn test_wrong_pin_stays_locked() {
        let gate = gate();
        gate.set_pin("246810").unwrap();
        gate.lock();

        assert!(!gate.check_secret("135790"));
        assert!(!gate.check_secret("24681"));
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn test_lock_is_idempotent() {
        let gate = gate();
        gate.lock();
        gate.lock();
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn test_new_session_starts_locked() {
        let durable = MemoryStore::new();
        {
            let gate = Gate::new(&durable, MemoryStore::new());
            gate.set_pin("246810").unwrap();
            assert!(gate.is_unlocked());
        }

        let next_session = Gate::new(&durable, MemoryStore::new());
        assert!(next_session.has_pin_set());
        assert!(!next_session.is_unlocked());
    }

    #[test]
    fn test_replacing_pin_requires_unlock() {
        let gate = gate();
        gate.set_pin("246810").unwrap();
        gate.lock();

        let err = gate.set_pin("111111").unwrap_err();
        assert!(matches!(err, AppError::Gate(GateError::Locked)));

        assert!(gate.check_secret("246810"));
        gate.set_pin("111111").unwrap();
        gate.lock();
        assert!(!gate.check_secret("246810"));
        assert!(gate.check_secret("111111"));
    }

    #[test]
    fn test_set_pin_rejects_bad_format() {
        let gate = gate();
        let err = gate.set_pin("12ab56").unwrap_err();
        assert!(matches!(err, AppError::Gate(GateError::InvalidPinFormat)));
        assert!(!gate.has_pin_set());
    }

    #[test]
    fn test_require_unlocked() {
        let gate = gate();
        assert!(gate.require_unlocked().is_err());
        gate.set_pin("246810").unwrap();
        assert!(gate.require_unlocked().is_ok());
    }

    #[test]
    fn test_unrecognized_flag_value_is_locked() {
        let session = MemoryStore::new();
        session.set(UNLOCKED_KEY, "yes").unwrap();
        let gate = Gate::new(MemoryStore::new(), &session);
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn test_unlock_not_reported_when_flag_cannot_be_written() {
        let durable = MemoryStore::new();
        durable.set(PIN_HASH_KEY, &hash_pin("246810")).unwrap();
        let gate = Gate::new(&durable, ReadOnlySession);

        assert!(!gate.check_secret("246810"));
        assert!(!gate.is_unlocked());
        assert!(matches!(
            gate.unlock("246810"),
            Err(AppError::Storage(StorageError::Unavailable(_)))
        ));
    }

    #[test]
    fn test_unlock_reports_why_it_failed() {
        let gate = gate();
        assert!(matches!(
            gate.unlock("246810"),
            Err(AppError::Gate(GateError::NoPinSet))
        ));

        gate.set_pin("246810").unwrap();
        gate.lock();
        assert!(matches!(
            gate.unlock("1234"),
            Err(AppError::Gate(GateError::InvalidPinFormat))
        ));
        assert!(matches!(
            gate.unlock("135790"),
            Err(AppError::Gate(GateError::WrongPin))
        ));
        assert!(!gate.is_unlocked());

        gate.unlock("246810").unwrap();
        assert!(gate.is_unlocked());
    }

    #[test]
    fn test_set_pin_reports_unwritable_session() {
        let gate = Gate::new(MemoryStore::new(), ReadOnlySession);

        let err = gate.set_pin("246810").unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::Unavailable(_))));
        assert!(!gate.is_unlocked());
    }
}
