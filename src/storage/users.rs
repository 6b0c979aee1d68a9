use redb::{ReadableTable, ReadableTableMetadata};

use super::db::{Database, DatabaseError};
use super::models::{Role, SessionRecord, UserRecord};
use super::tables::*;

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Store a new user, enforcing unique usernames and emails.
    pub fn create_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        self.insert_user(user, false)
    }

    /// Store the very first account. Fails with `Forbidden` once any user
    /// exists; the emptiness check and the insert share one write transaction.
    pub fn create_first_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        self.insert_user(user, true)
    }

    fn insert_user(&self, user: &UserRecord, require_empty: bool) -> Result<(), DatabaseError> {
        debug_assert!(!user.id.is_empty(), "user id must not be empty");

        let username_key = normalize(&user.username);
        let email_key = normalize(&user.email);

        let write_txn = self.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            if require_empty && users.len()? > 0 {
                return Err(DatabaseError::Forbidden(
                    "admin registration requires a registration code".to_string(),
                ));
            }

            let mut usernames = write_txn.open_table(USERNAMES)?;
            if usernames.get(username_key.as_str())?.is_some() {
                return Err(DatabaseError::Conflict(format!(
                    "username '{}' is already taken",
                    user.username
                )));
            }

            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if emails.get(email_key.as_str())?.is_some() {
                return Err(DatabaseError::Conflict(format!(
                    "email '{}' is already registered",
                    user.email
                )));
            }

            let data = rmp_serde::to_vec_named(user)?;
            users.insert(user.id.as_str(), data.as_slice())?;
            usernames.insert(username_key.as_str(), user.id.as_str())?;
            emails.insert(email_key.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let id = {
            let read_txn = self.begin_read()?;
            let emails = read_txn.open_table(USER_EMAILS)?;
            let id = emails
                .get(normalize(email).as_str())?
                .map(|v| v.value().to_string());
            id
        };

        match id {
            Some(id) => self.get_user(&id),
            None => Ok(None),
        }
    }

    pub fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERNAMES)?;
        Ok(table.get(normalize(username).as_str())?.is_some())
    }

    /// All users, oldest first
    pub fn list_users(&self) -> Result<Vec<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let mut users = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let user: UserRecord = rmp_serde::from_slice(value.value())?;
            users.push(user);
        }

        users.sort_by_key(|user| user.created_at);
        Ok(users)
    }

    pub fn user_count(&self) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        Ok(table.len()?)
    }

    /// Change a user's role. Returns the updated user, or None if it does not exist.
    pub fn set_user_role(&self, id: &str, role: Role) -> Result<Option<UserRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let updated = {
            let mut table = write_txn.open_table(USERS)?;
            let existing: Option<UserRecord> = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            match existing {
                Some(mut user) => {
                    user.role = role;
                    let data = rmp_serde::to_vec_named(&user)?;
                    table.insert(id, data.as_slice())?;
                    Some(user)
                }
                None => None,
            }
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a user, its index entries and every session it holds.
    pub fn delete_user(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing: Option<UserRecord> = {
            let table = write_txn.open_table(USERS)?;
            let result = match table.get(id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            result
        };

        let deleted = match existing {
            Some(user) => {
                {
                    let mut table = write_txn.open_table(USERS)?;
                    table.remove(id)?;
                }
                {
                    let mut usernames = write_txn.open_table(USERNAMES)?;
                    usernames.remove(normalize(&user.username).as_str())?;
                }
                {
                    let mut emails = write_txn.open_table(USER_EMAILS)?;
                    emails.remove(normalize(&user.email).as_str())?;
                }
                {
                    let mut sessions = write_txn.open_table(SESSIONS)?;
                    let owned: Vec<String> = sessions
                        .iter()?
                        .filter_map(|r| match r {
                            Ok((k, v)) => {
                                let record: Result<SessionRecord, _> =
                                    rmp_serde::from_slice(v.value());
                                match record {
                                    Ok(s) if s.user_id == id => Some(Ok(k.value().to_string())),
                                    Ok(_) => None,
                                    Err(e) => Some(Err(DatabaseError::from(e))),
                                }
                            }
                            Err(e) => Some(Err(DatabaseError::from(e))),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    for key in owned {
                        sessions.remove(key.as_str())?;
                    }
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    pub fn put_session(
        &self,
        token_hash: &str,
        session: &SessionRecord,
    ) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let data = rmp_serde::to_vec_named(session)?;
            table.insert(token_hash, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_session(&self, token_hash: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        match table.get(token_hash)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let removed = table.remove(token_hash)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
