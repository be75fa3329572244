use std::cell::{Ref, RefCell, RefMut};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Scene member that is either owned by the scene or shared with the caller.
///
/// Owned entities are dropped together with the scene. Shared entities stay
/// alive as long as the caller keeps its handle.
#[derive(Debug)]
pub enum Entity<T> {
    Owned(T),
    Shared(Rc<RefCell<T>>),
}

impl<T> Entity<T> {
    pub fn shared(value: T) -> (Self, Rc<RefCell<T>>) {
        let handle = Rc::new(RefCell::new(value));
        (Entity::Shared(Rc::clone(&handle)), handle)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Entity::Owned(_))
    }

    pub fn borrow(&self) -> EntityRef<'_, T> {
        match self {
            Entity::Owned(value) => EntityRef::Owned(value),
            Entity::Shared(cell) => EntityRef::Shared(cell.borrow()),
        }
    }

    pub fn borrow_mut(&mut self) -> EntityMut<'_, T> {
        match self {
            Entity::Owned(value) => EntityMut::Owned(value),
            Entity::Shared(cell) => EntityMut::Shared(cell.borrow_mut()),
        }
    }
}

impl<T> From<T> for Entity<T> {
    fn from(value: T) -> Self {
        Entity::Owned(value)
    }
}

impl<T> From<Rc<RefCell<T>>> for Entity<T> {
    fn from(handle: Rc<RefCell<T>>) -> Self {
        Entity::Shared(handle)
    }
}

pub enum EntityRef<'a, T> {
    Owned(&'a T),
    Shared(Ref<'a, T>),
}

impl<T> Deref for EntityRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            EntityRef::Owned(value) => *value,
            EntityRef::Shared(value) => &**value,
        }
    }
}

pub enum EntityMut<'a, T> {
    Owned(&'a mut T),
    Shared(RefMut<'a, T>),
}

impl<T> Deref for EntityMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            EntityMut::Owned(value) => &**value,
            EntityMut::Shared(value) => &**value,
        }
    }
}

impl<T> DerefMut for EntityMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            EntityMut::Owned(value) => &mut **value,
            EntityMut::Shared(value) => &mut **value,
        }
    }
}
