//! MFRC522 card reader adapter (ESP-IDF only).
//!
//! Polls the reader for a newly presented ISO 14443A card, selects it and
//! hands the UID to the domain as a [`Credential`].  "No card in field"
//! shows up as a REQA timeout from the chip and maps to `Ok(None)`; any
//! other failure is a [`ReaderError::Communication`].

use log::{debug, info, warn};
use mfrc522::comm::Interface;
use mfrc522::{Initialized, Mfrc522};

use crate::app::ports::CredentialReader;
use crate::credential::Credential;
use crate::error::{Error, ReaderError};

pub struct Rc522Reader<COMM: Interface> {
    dev: Mfrc522<COMM, Initialized>,
}

impl<COMM: Interface> Rc522Reader<COMM> {
    /// Initialise the chip behind `comm`.
    pub fn new(comm: COMM) -> Result<Self, Error> {
        let mut dev = Mfrc522::new(comm)
            .init()
            .map_err(|_| Error::Init("MFRC522 init"))?;

        match dev.version() {
            Ok(v) => info!("MFRC522: firmware version 0x{:02X}", v),
            Err(_) => warn!("MFRC522: version read failed"),
        }

        Ok(Self { dev })
    }
}

impl<COMM: Interface> CredentialReader for Rc522Reader<COMM> {
    fn poll_new_token(&mut self) -> Result<Option<Credential>, ReaderError> {
        let atqa = match self.dev.new_card_present() {
            Ok(atqa) => atqa,
            Err(mfrc522::Error::Timeout) => return Ok(None),
            Err(_) => return Err(ReaderError::Communication),
        };

        let uid = self
            .dev
            .select(&atqa)
            .map_err(|_| ReaderError::Communication)?;

        // Park the card so it is not reported again while it stays in the field.
        if self.dev.hlta().is_err() {
            debug!("MFRC522: HLTA not acknowledged");
        }

        Credential::from_uid(uid.as_bytes()).map(Some)
    }
}
