//! In-memory fakes for repositories and the mailer.
//!
//! `InMemoryStore` implements both repository traits over one set of maps so
//! joins and cascading deletes behave like the Postgres schema.

use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use lettre::message::Mailbox;
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        house::{House, NewHouse},
        notification::NotificationEvent,
        transaction::{BookingKey, NewTransaction, PaymentStatus, Transaction, TransactionDetails},
        user::User,
    },
    repositories::{HouseRepository, StatusUpdate, TransactionRepository},
    services::mailer::{MailError, Mailer, OutgoingMail},
};

pub const SEED_HOUSE_ID: i64 = 1;
pub const SEED_USER_ID: i64 = 1;

#[derive(Default)]
struct State {
    houses: BTreeMap<i64, House>,
    next_house_id: i64,
    users: BTreeMap<i64, User>,
    transactions: BTreeMap<i64, Transaction>,
    events: Vec<NotificationEvent>,
}

impl State {
    fn seed(&mut self) {
        self.houses.entry(SEED_HOUSE_ID).or_insert_with(|| House {
            id: SEED_HOUSE_ID,
            name: "Sunny Loft".to_string(),
            city_name: "Jakarta".to_string(),
            address: "Jl. Sudirman 1".to_string(),
            price: 900_000,
            type_rent: "day".to_string(),
            amenities: json!(["Furnished"]),
            bedroom: 2,
            bathroom: 1,
            description: "Close to the station".to_string(),
            area: "1800 sqft".to_string(),
            image: "seed-loft.png".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        self.next_house_id = self.next_house_id.max(SEED_HOUSE_ID);
        self.users.entry(SEED_USER_ID).or_insert_with(|| User {
            id: SEED_USER_ID,
            fullname: "Ayu Lestari".to_string(),
            email: "ayu@example.com".to_string(),
        });
    }

    fn details(&self, transaction: &Transaction) -> Option<TransactionDetails> {
        let house = self.houses.get(&transaction.house_id)?;
        let user = self.users.get(&transaction.user_id)?;
        Some(TransactionDetails {
            transaction: transaction.clone(),
            house_name: house.name.clone(),
            house_price: house.price,
            user_fullname: user.fullname.clone(),
            user_email: user.email.clone(),
        })
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// One house and one user, no transactions.
    pub fn with_seed_data() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().seed();
        store
    }

    /// Insert a pending transaction with `id` for the seed house and user.
    pub fn seed_transaction(&self, id: i64) {
        let mut state = self.state.lock().unwrap();
        state.seed();
        state.transactions.insert(
            id,
            Transaction {
                id,
                check_in: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                check_out: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
                house_id: SEED_HOUSE_ID,
                user_id: SEED_USER_ID,
                total: 2_700_000,
                status_payment: PaymentStatus::Pending,
                attachment: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
    }

    pub fn status_of(&self, id: i64) -> Option<PaymentStatus> {
        let state = self.state.lock().unwrap();
        state.transactions.get(&id).map(|t| t.status_payment)
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    /// Sorted ascending.
    pub fn transaction_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().transactions.keys().copied().collect()
    }

    pub fn house(&self, id: i64) -> Option<House> {
        self.state.lock().unwrap().houses.get(&id).cloned()
    }

    pub fn house_count(&self) -> usize {
        self.state.lock().unwrap().houses.len()
    }

    pub fn notification_events(&self) -> Vec<NotificationEvent> {
        self.state.lock().unwrap().events.clone()
    }
}

#[async_trait]
impl HouseRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<House>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.houses.values().rev().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<House>, AppError> {
        Ok(self.house(id))
    }

    async fn create(&self, house: NewHouse) -> Result<House, AppError> {
        let mut state = self.state.lock().unwrap();
        state.next_house_id += 1;
        let created = House {
            id: state.next_house_id,
            name: house.name,
            city_name: house.city_name,
            address: house.address,
            price: house.price,
            type_rent: house.type_rent,
            amenities: house.amenities,
            bedroom: house.bedroom,
            bathroom: house.bathroom,
            description: house.description,
            area: house.area,
            image: house.image,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.houses.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, house: &House) -> Result<House, AppError> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .houses
            .get_mut(&house.id)
            .ok_or(AppError::HouseNotFound)?;
        *stored = House {
            updated_at: Utc::now(),
            ..house.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<Option<House>, AppError> {
        let mut state = self.state.lock().unwrap();
        let removed = state.houses.remove(&id);
        if removed.is_some() {
            state.transactions.retain(|_, t| t.house_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<TransactionDetails>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .values()
            .rev()
            .filter_map(|t| state.details(t))
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<TransactionDetails>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.transactions.get(&id).and_then(|t| state.details(t)))
    }

    async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let taken = self.state.lock().unwrap().transactions.contains_key(&id);
        // Let concurrent callers run between the check and their insert,
        // as they would against a real database.
        tokio::task::yield_now().await;
        Ok(taken)
    }

    async fn find_pending(&self, key: &BookingKey) -> Result<Option<TransactionDetails>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .values()
            .rev()
            .filter(|t| t.status_payment == PaymentStatus::Pending && key.matches(t))
            .find_map(|t| state.details(t)))
    }

    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.transactions.contains_key(&transaction.id) {
            return Err(AppError::DuplicateTransaction(transaction.id));
        }
        if !state.houses.contains_key(&transaction.house_id)
            || !state.users.contains_key(&transaction.user_id)
        {
            return Err(AppError::Validation(
                "house_id or user_id does not exist".to_string(),
            ));
        }

        let created = Transaction {
            id: transaction.id,
            check_in: transaction.check_in,
            check_out: transaction.check_out,
            house_id: transaction.house_id,
            user_id: transaction.user_id,
            total: transaction.total,
            status_payment: transaction.status_payment,
            attachment: transaction.attachment,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.transactions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_status(&self, id: i64, status: PaymentStatus) -> Result<StatusUpdate, AppError> {
        let mut state = self.state.lock().unwrap();
        Ok(match state.transactions.get_mut(&id) {
            Some(t) if t.status_payment == status => StatusUpdate::Unchanged,
            Some(t) => {
                t.status_payment = status;
                t.updated_at = Utc::now();
                StatusUpdate::Changed
            }
            None => StatusUpdate::Missing,
        })
    }

    async fn delete(&self, id: i64) -> Result<Option<Transaction>, AppError> {
        Ok(self.state.lock().unwrap().transactions.remove(&id))
    }

    async fn record_notification(&self, event: NotificationEvent) -> Result<(), AppError> {
        self.state.lock().unwrap().events.push(event);
        Ok(())
    }
}

/// Mailer that records what it was asked to send.
///
/// `failing(n)` makes the first `n` attempts fail.
#[derive(Default)]
pub struct RecordingMailer {
    fail_first: u32,
    attempts: AtomicU32,
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn failing(fail_first: u32) -> Self {
        Self {
            fail_first,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        // Give other tasks a turn, as a network round trip would.
        tokio::task::yield_now().await;
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            let source = "relay down".parse::<Mailbox>().unwrap_err();
            return Err(MailError::Address {
                address: mail.to.clone(),
                source,
            });
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}
