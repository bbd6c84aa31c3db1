//! Process-local storage used when no database is configured.
//!
//! One [`InMemoryStore`] backs all three repository traits so the
//! relations between users, posts and tags behave like the foreign keys
//! of the SQL schema: deleting a user drops their posts, deleting a tag
//! detaches it from every post. Data is lost on restart.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::data::post_repository::{
    NewPost, PostQuery, PostRepository, PostSort, SortDirection, SortField,
};
use crate::data::tag_repository::TagRepository;
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, canonical_tag_ids};
use crate::domain::tag::Tag;
use crate::domain::user::User;

#[derive(Default)]
struct State {
    users: BTreeMap<i64, UserCredentials>,
    posts: BTreeMap<i64, Post>,
    tags: BTreeMap<i64, Tag>,
    last_user_id: i64,
    last_post_id: i64,
    last_tag_id: i64,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|c| c.user.email == email && Some(c.user.id) != except)
    }

    fn tag_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.tags
            .values()
            .any(|t| t.name == name && Some(t.id) != except)
    }

    fn check_tags_exist(&self, tag_ids: &[i64]) -> Result<(), DomainError> {
        if tag_ids.iter().all(|id| self.tags.contains_key(id)) {
            Ok(())
        } else {
            Err(DomainError::NotFound("tag".to_string()))
        }
    }
}

#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// A fresh `updated_at` that never precedes `created_at`.
fn touch(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at)
}

fn compare_posts(sort: PostSort, a: &Post, b: &Post) -> Ordering {
    let by_field = match sort.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Id => Ordering::Equal,
    };
    let ordering = by_field.then(a.id.cmp(&b.id));
    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        if state.email_taken(&input.email, None) {
            return Err(DomainError::AlreadyExists("email".to_string()));
        }

        state.last_user_id += 1;
        let now = Utc::now();
        let user = User::new(
            state.last_user_id,
            input.email,
            input.first_name,
            input.last_name,
            input.birthday,
            now,
            now,
        )?;
        state.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: input.password_hash,
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|c| c.user.clone()))
    }

    async fn user_exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.state.read().await.users.contains_key(&id))
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state.users.values().map(|c| c.user.clone()).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn update_user(
        &self,
        user: &User,
        password_hash: Option<String>,
    ) -> Result<Option<User>, DomainError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Ok(None);
        }
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(DomainError::AlreadyExists("email".to_string()));
        }

        let Some(stored) = state.users.get_mut(&user.id) else {
            return Ok(None);
        };
        let created_at = stored.user.created_at;
        stored.user = User {
            created_at,
            updated_at: touch(created_at),
            ..user.clone()
        };
        if let Some(hash) = password_hash {
            stored.password_hash = hash;
        }
        Ok(Some(stored.user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.posts.retain(|_, post| post.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&input.user_id) {
            return Err(DomainError::NotFound("user".to_string()));
        }
        state.check_tags_exist(&input.tag_ids)?;

        state.last_post_id += 1;
        let now = Utc::now();
        let post = Post::new(
            state.last_post_id,
            input.title,
            input.content,
            input.published,
            input.user_id,
            input.tag_ids,
            now,
            now,
        )?;
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn update_post(&self, post: &Post) -> Result<Option<Post>, DomainError> {
        let mut state = self.state.write().await;
        state.check_tags_exist(&post.tag_ids)?;

        let Some(stored) = state.posts.get_mut(&post.id) else {
            return Ok(None);
        };
        stored.title.clone_from(&post.title);
        stored.content.clone_from(&post.content);
        stored.published = post.published;
        stored.tag_ids = canonical_tag_ids(post.tag_ids.clone());
        stored.updated_at = touch(stored.created_at);
        Ok(Some(stored.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.state.write().await.posts.remove(&id).is_some())
    }

    async fn list_posts(&self, query: PostQuery) -> Result<Vec<Post>, DomainError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| post.published == query.published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| compare_posts(query.sort, a, b));

        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.pagination.limit()).unwrap_or(usize::MAX);
        Ok(posts.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_posts(&self, published: bool) -> Result<i64, DomainError> {
        let state = self.state.read().await;
        let count = state
            .posts
            .values()
            .filter(|post| post.published == published)
            .count();
        i64::try_from(count).map_err(|err| DomainError::Unexpected(err.to_string()))
    }

    async fn list_posts_by_tag(&self, tag_id: i64) -> Result<Vec<Post>, DomainError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|post| post.published && post.tag_ids.contains(&tag_id))
            .cloned()
            .collect();
        posts.sort_by(|a, b| compare_posts(PostSort::default(), a, b));
        Ok(posts)
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn create_tag(&self, name: &str) -> Result<Tag, DomainError> {
        let mut state = self.state.write().await;
        if state.tag_name_taken(name, None) {
            return Err(DomainError::AlreadyExists("tag name".to_string()));
        }

        state.last_tag_id += 1;
        let tag = Tag::new(state.last_tag_id, name)?;
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn get_tag(&self, id: i64) -> Result<Option<Tag>, DomainError> {
        Ok(self.state.read().await.tags.get(&id).cloned())
    }

    async fn list_tags(&self, name_contains: Option<&str>) -> Result<Vec<Tag>, DomainError> {
        let needle = name_contains.map(str::to_lowercase);
        let state = self.state.read().await;
        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|tag| match &needle {
                Some(needle) => tag.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(tags)
    }

    async fn find_all_by_id(&self, ids: &[i64]) -> Result<Vec<Tag>, DomainError> {
        let state = self.state.read().await;
        Ok(canonical_tag_ids(ids.to_vec())
            .into_iter()
            .filter_map(|id| state.tags.get(&id).cloned())
            .collect())
    }

    async fn update_tag(&self, tag: &Tag) -> Result<Option<Tag>, DomainError> {
        let mut state = self.state.write().await;
        if !state.tags.contains_key(&tag.id) {
            return Ok(None);
        }
        if state.tag_name_taken(&tag.name, Some(tag.id)) {
            return Err(DomainError::AlreadyExists("tag name".to_string()));
        }
        state.tags.insert(tag.id, tag.clone());
        Ok(Some(tag.clone()))
    }

    async fn delete_tag(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.state.write().await;
        if state.tags.remove(&id).is_none() {
            return Ok(false);
        }
        for post in state.posts.values_mut() {
            post.tag_ids.retain(|tag_id| *tag_id != id);
        }
        Ok(true)
    }
}
