//! Plain-text file storage.
//!
//! Each store is a UTF-8 text file with one record per line. Appends open the
//! file in append mode; a missing file reads as empty and is created on first
//! write. User removal rewrites the users file in full, which is only safe
//! because [`PersistenceLog`](crate::PersistenceLog) is the single writer.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use super::{Store, StorageError, UserRecord, single_line};

/// Users and messages stored as two text files.
#[derive(Debug, Clone)]
pub struct FileStore {
    users_path: PathBuf,
    messages_path: PathBuf,
}

impl FileStore {
    /// Open (creating if missing) the two store files.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if either file cannot be created or opened
    /// for appending.
    pub fn open(
        users_path: impl Into<PathBuf>,
        messages_path: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        let store = Self { users_path: users_path.into(), messages_path: messages_path.into() };

        open_append(&store.users_path)?;
        open_append(&store.messages_path)?;

        Ok(store)
    }

    /// Path of the users file.
    pub fn users_path(&self) -> &Path {
        &self.users_path
    }

    /// Path of the messages file.
    pub fn messages_path(&self) -> &Path {
        &self.messages_path
    }
}

fn open_append(path: &Path) -> io::Result<fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = open_append(path)?;
    writeln!(file, "{line}")?;
    file.flush()
}

impl Store for FileStore {
    fn append_user(&self, name: &str) -> Result<u64, StorageError> {
        let existing = read_lines(&self.users_path)?.iter().filter(|l| !l.is_empty()).count();
        let record = UserRecord { seq: existing as u64 + 1, name: single_line(name) };

        append_line(&self.users_path, &record.to_line())?;

        Ok(record.seq)
    }

    fn append_message(&self, line: &str) -> Result<(), StorageError> {
        append_line(&self.messages_path, &single_line(line))?;
        Ok(())
    }

    fn remove_user(&self, name: &str) -> Result<usize, StorageError> {
        let name = single_line(name);
        let lines = read_lines(&self.users_path)?;
        let before = lines.len();

        let kept: Vec<String> = lines
            .into_iter()
            .filter(|line| UserRecord::parse(line).is_none_or(|r| r.name != name))
            .collect();

        let removed = before - kept.len();
        if removed > 0 {
            let mut contents = kept.join("\n");
            if !contents.is_empty() {
                contents.push('\n');
            }
            fs::write(&self.users_path, contents)?;
        }

        Ok(removed)
    }

    fn users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(read_lines(&self.users_path)?.iter().filter_map(|l| UserRecord::parse(l)).collect())
    }

    fn messages(&self) -> Result<Vec<String>, StorageError> {
        Ok(read_lines(&self.messages_path)?)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn open_in(dir: &Path) -> FileStore {
        FileStore::open(dir.join("users.txt"), dir.join("messages.txt")).unwrap()
    }

    #[test]
    fn open_creates_empty_files() {
        let dir = tempdir().unwrap();
        let store = open_in(dir.path());

        assert!(store.users_path().exists());
        assert!(store.messages_path().exists());
        assert!(store.users().unwrap().is_empty());
        assert!(store.messages().unwrap().is_empty());
    }

    #[test]
    fn open_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = FileStore::open(missing.join("u.txt"), missing.join("m.txt"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn users_get_sequential_numbers() {
        let dir = tempdir().unwrap();
        let store = open_in(dir.path());

        assert_eq!(store.append_user("alice").unwrap(), 1);
        assert_eq!(store.append_user("bob").unwrap(), 2);
        assert_eq!(store.append_user("alice").unwrap(), 3);

        let contents = fs::read_to_string(store.users_path()).unwrap();
        assert_eq!(contents, "1:alice\n2:bob\n3:alice\n");
    }

    #[test]
    fn numbering_continues_from_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("users.txt"), "1:old\n2:older\n").unwrap();

        let store = open_in(dir.path());
        assert_eq!(store.append_user("new").unwrap(), 3);
    }

    #[test]
    fn messages_are_raw_lines() {
        let dir = tempdir().unwrap();
        let store = open_in(dir.path());

        store.append_message("2024-05-01 10:00:00 alice: hi").unwrap();
        store.append_message("PRIVATE_MESSAGE:bob:alice:secret").unwrap();

        assert_eq!(
            store.messages().unwrap(),
            vec!["2024-05-01 10:00:00 alice: hi", "PRIVATE_MESSAGE:bob:alice:secret"]
        );
    }

    #[test]
    fn multi_line_message_stays_one_record() {
        let dir = tempdir().unwrap();
        let store = open_in(dir.path());

        store.append_message("first\nsecond").unwrap();
        assert_eq!(store.messages().unwrap(), vec!["first second"]);
    }

    #[test]
    fn remove_user_drops_every_matching_line() {
        let dir = tempdir().unwrap();
        let store = open_in(dir.path());

        store.append_user("alice").unwrap();
        store.append_user("bob").unwrap();
        store.append_user("alice").unwrap();

        assert_eq!(store.remove_user("alice").unwrap(), 2);
        assert_eq!(store.users().unwrap(), vec![UserRecord { seq: 2, name: "bob".to_string() }]);
        assert_eq!(store.remove_user("alice").unwrap(), 0);
    }

    #[test]
    fn remove_last_user_leaves_empty_file() {
        let dir = tempdir().unwrap();
        let store = open_in(dir.path());

        store.append_user("solo").unwrap();
        assert_eq!(store.remove_user("solo").unwrap(), 1);
        assert_eq!(fs::read_to_string(store.users_path()).unwrap(), "");
    }
}
