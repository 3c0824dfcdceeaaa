//! MongoDB-backed repositories.

use super::{
    AccountRepository, LoanRepository, TransactionRepository, LOAN_SCAN_CAP, SCAN_CAP,
};
use crate::models::{
    money, Account, Loan, LoanStatus, ProfileUpdate, Transaction, TransactionType,
};
use async_trait::async_trait;
use bank_core::error::AppError;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use rust_decimal::Decimal;

/// Handle to the MongoDB deployment. Constructed once at process start and
/// injected into the repositories; there is no module-level client.
#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    /// Create the indexes the repositories rely on. The unique index on
    /// `account_number` backs the generation retry loop.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let account_number_index = IndexModel::builder()
            .keys(doc! { "account_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("account_number_lookup".to_string())
                    .build(),
            )
            .build();
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().name("email_lookup".to_string()).build())
            .build();
        self.accounts()
            .create_indexes([account_number_index, email_index], None)
            .await?;

        let from_index = IndexModel::builder()
            .keys(doc! { "from_account": 1, "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("from_account_timeline".to_string())
                    .build(),
            )
            .build();
        let to_index = IndexModel::builder()
            .keys(doc! { "to_account": 1, "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("to_account_timeline".to_string())
                    .build(),
            )
            .build();
        let timestamp_index = IndexModel::builder()
            .keys(doc! { "timestamp": -1 })
            .options(IndexOptions::builder().name("timeline".to_string()).build())
            .build();
        self.transactions()
            .create_indexes([from_index, to_index, timestamp_index], None)
            .await?;

        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().name("loan_owner".to_string()).build())
            .build();
        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1 })
            .options(IndexOptions::builder().name("loan_status".to_string()).build())
            .build();
        self.loans().create_indexes([user_index, status_index], None).await?;

        tracing::info!("Banking service indexes initialized");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn accounts(&self) -> Collection<Account> {
        self.db.collection("accounts")
    }

    pub fn transactions(&self) -> Collection<Transaction> {
        self.db.collection("transactions")
    }

    pub fn loans(&self) -> Collection<Loan> {
        self.db.collection("loans")
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Read an aggregation `total` that Mongo may widen to any numeric type.
fn total_minor_units(result: Option<&Document>) -> i64 {
    match result.and_then(|doc| doc.get("total")) {
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Int32(v)) => *v as i64,
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

async fn sum_minor_units(
    collection: &Database,
    collection_name: &str,
) -> Result<Decimal, AppError> {
    let pipeline = vec![doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } }];
    let mut cursor = collection
        .collection::<Document>(collection_name)
        .aggregate(pipeline, None)
        .await?;
    let first = cursor.try_next().await?;
    Ok(money::from_minor_units(total_minor_units(first.as_ref())))
}

#[derive(Clone)]
pub struct MongoAccountRepository {
    collection: Collection<Account>,
}

impl MongoAccountRepository {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.accounts(),
        }
    }
}

#[async_trait]
impl AccountRepository for MongoAccountRepository {
    async fn get_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.collection.find_one(doc! { "email": email }, None).await?)
    }

    async fn get_by_account_number(&self, number: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .collection
            .find_one(doc! { "account_number": number }, None)
            .await?)
    }

    async fn create(&self, account: Account) -> Result<Account, AppError> {
        self.collection.insert_one(&account, None).await?;
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Account>, AppError> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut set = Document::new();
        if let Some(first_name) = &update.first_name {
            set.insert("first_name", first_name);
        }
        if let Some(last_name) = &update.last_name {
            set.insert("last_name", last_name);
        }
        if let Some(email) = &update.email {
            set.insert("email", email);
        }

        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
            .await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn update_balance(&self, id: &str, new_balance: Decimal) -> Result<bool, AppError> {
        let minor = money::to_minor_units(new_balance).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("balance out of range for minor units"))
        })?;
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "balance": minor } }, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list(&self, limit: i64, offset: u64) -> Result<Vec<Account>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1 })
            .skip(offset)
            .limit(limit)
            .build();
        let cursor = self.collection.find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(None, None).await?)
    }

    async fn created_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Account>, AppError> {
        let filter = doc! {
            "created_at": {
                "$gte": bson::DateTime::from_chrono(start),
                "$lte": bson::DateTime::from_chrono(end),
            }
        };
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let cursor = self.collection.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[derive(Clone)]
pub struct MongoTransactionRepository {
    collection: Collection<Transaction>,
    db: Database,
}

impl MongoTransactionRepository {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.transactions(),
            db: db.database().clone(),
        }
    }

    fn account_filter(account_number: &str) -> Document {
        doc! {
            "$or": [
                { "from_account": account_number },
                { "to_account": account_number },
            ]
        }
    }

    fn type_filter(transaction_type: Option<TransactionType>) -> Document {
        match transaction_type {
            Some(t) => doc! { "type": t.as_str() },
            None => Document::new(),
        }
    }
}

#[async_trait]
impl TransactionRepository for MongoTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, AppError> {
        self.collection.insert_one(&transaction, None).await?;
        Ok(transaction)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Transaction>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_by_account(
        &self,
        account_number: &str,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Transaction>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .skip(offset)
            .limit(limit)
            .build();
        let cursor = self
            .collection
            .find(Self::account_filter(account_number), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_by_account(&self, account_number: &str) -> Result<u64, AppError> {
        Ok(self
            .collection
            .count_documents(Self::account_filter(account_number), None)
            .await?)
    }

    async fn list_all(
        &self,
        limit: i64,
        offset: u64,
        transaction_type: Option<TransactionType>,
    ) -> Result<Vec<Transaction>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .skip(offset)
            .limit(limit)
            .build();
        let cursor = self
            .collection
            .find(Self::type_filter(transaction_type), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, transaction_type: Option<TransactionType>) -> Result<u64, AppError> {
        Ok(self
            .collection
            .count_documents(Self::type_filter(transaction_type), None)
            .await?)
    }

    async fn total_volume(&self) -> Result<Decimal, AppError> {
        sum_minor_units(&self.db, "transactions").await
    }

    async fn in_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, AppError> {
        let filter = doc! {
            "timestamp": {
                "$gte": bson::DateTime::from_chrono(start),
                "$lte": bson::DateTime::from_chrono(end),
            }
        };
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": 1 })
            .limit(SCAN_CAP)
            .build();
        let cursor = self.collection.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Transaction>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1 })
            .limit(limit)
            .build();
        let cursor = self.collection.find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[derive(Clone)]
pub struct MongoLoanRepository {
    collection: Collection<Loan>,
    db: Database,
}

impl MongoLoanRepository {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.loans(),
            db: db.database().clone(),
        }
    }

    fn status_filter(status: Option<LoanStatus>) -> Document {
        match status {
            Some(s) => doc! { "status": s.as_str() },
            None => Document::new(),
        }
    }
}

#[async_trait]
impl LoanRepository for MongoLoanRepository {
    async fn create(&self, loan: Loan) -> Result<Loan, AppError> {
        self.collection.insert_one(&loan, None).await?;
        Ok(loan)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Loan>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Loan>, AppError> {
        let options = FindOptions::builder().limit(LOAN_SCAN_CAP).build();
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn transition(
        &self,
        id: &str,
        from: LoanStatus,
        to: LoanStatus,
        approval_date: Option<DateTime<Utc>>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Option<Loan>, AppError> {
        // The status predicate in the filter is what makes the transition
        // race-safe: of two concurrent callers only one matches the document.
        let filter = doc! { "_id": id, "status": from.as_str() };
        let update = match approval_date {
            Some(approved) => doc! {
                "$set": {
                    "status": to.as_str(),
                    "approval_date": bson::DateTime::from_chrono(approved),
                    "due_date": due_date.map(bson::DateTime::from_chrono),
                }
            },
            None => doc! {
                "$set": { "status": to.as_str() },
                "$unset": { "approval_date": "", "due_date": "" },
            },
        };

        let result = self.collection.update_one(filter, update, None).await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn list_all(
        &self,
        limit: i64,
        offset: u64,
        status: Option<LoanStatus>,
    ) -> Result<Vec<Loan>, AppError> {
        let options = FindOptions::builder().skip(offset).limit(limit).build();
        let cursor = self
            .collection
            .find(Self::status_filter(status), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, status: Option<LoanStatus>) -> Result<u64, AppError> {
        Ok(self
            .collection
            .count_documents(Self::status_filter(status), None)
            .await?)
    }

    async fn total_amount(&self) -> Result<Decimal, AppError> {
        sum_minor_units(&self.db, "loans").await
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Loan>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "request_date": -1 })
            .limit(limit)
            .build();
        let cursor = self.collection.find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }
}
