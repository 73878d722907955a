//! Listener dispatch behavior through the collection API.
//!
//! 1. A listener registered twice runs twice; removing one registration
//!    leaves one.
//! 2. A listener that unregisters and re-registers itself mid-dispatch
//!    does not disturb that or any later dispatch.
//! 3. A panicking listener is reported to the fault sink once, the
//!    mutation stands, and later listeners still run.
//! 4. Listeners see the post-mutation state and may mutate re-entrantly.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ftui_collections::{
    ChangeListener, DispatchConfig, ListChange, ListenerChannel, ListenerFault, MapChange,
    ObservableList, ObservableMap, ObservableSet, SetChange,
};

fn counting_listener<Ch: 'static>(count: &Rc<Cell<u32>>) -> ChangeListener<Ch> {
    let count = Rc::clone(count);
    Rc::new(move |_: &mut Ch| count.set(count.get() + 1))
}

#[test]
fn duplicate_registration_runs_per_registration() {
    let set: ObservableSet<i32> = ObservableSet::new();
    let count = Rc::new(Cell::new(0));
    let listener = counting_listener::<SetChange<i32>>(&count);
    set.add_listener(Rc::clone(&listener));
    set.add_listener(Rc::clone(&listener));

    set.add(1).unwrap();
    assert_eq!(count.get(), 2);

    assert!(set.remove_listener(&listener));
    set.add(2).unwrap();
    assert_eq!(count.get(), 3);

    assert!(set.remove_listener(&listener));
    assert!(!set.remove_listener(&listener));
    set.add(3).unwrap();
    assert_eq!(count.get(), 3);
}

#[test]
fn listener_reregistering_itself_is_safe() {
    let list = ObservableList::from_vec(vec![0]);
    let calls = Rc::new(Cell::new(0));
    let slot: Rc<RefCell<Option<Weak<dyn Fn(&mut ListChange<i32>)>>>> =
        Rc::new(RefCell::new(None));

    let handle = list.clone();
    let slot_in = Rc::clone(&slot);
    let calls_in = Rc::clone(&calls);
    let listener: ChangeListener<ListChange<i32>> = Rc::new(move |_: &mut ListChange<i32>| {
        calls_in.set(calls_in.get() + 1);
        if let Some(me) = slot_in.borrow().as_ref().and_then(Weak::upgrade) {
            assert!(handle.remove_listener(&me));
            handle.add_listener(me);
        }
    });
    *slot.borrow_mut() = Some(Rc::downgrade(&listener));
    list.add_listener(listener);

    for i in 1..=3 {
        list.add(i).unwrap();
    }
    assert_eq!(calls.get(), 3);
}

#[test]
fn listener_added_during_dispatch_waits_for_next_dispatch() {
    let list = ObservableList::from_vec(vec![0]);
    let late_calls = Rc::new(Cell::new(0));
    let late = counting_listener::<ListChange<i32>>(&late_calls);
    let installed = Rc::new(Cell::new(false));

    let handle = list.clone();
    let installed_in = Rc::clone(&installed);
    list.add_listener(Rc::new(move |_: &mut ListChange<i32>| {
        if !installed_in.replace(true) {
            handle.add_listener(Rc::clone(&late));
        }
    }));

    list.add(1).unwrap();
    assert_eq!(late_calls.get(), 0);
    list.add(2).unwrap();
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn panicking_listener_is_isolated() {
    let faults: Rc<RefCell<Vec<ListenerFault>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&faults);
    let config = DispatchConfig::new()
        .with_fault_sink(move |fault| sink.borrow_mut().push(fault.clone()));
    let map: ObservableMap<&str, i32> = ObservableMap::with_config(Vec::new(), &config);

    let after = Rc::new(Cell::new(0));
    map.add_listener(Rc::new(|_: &mut MapChange<&str, i32>| panic!("listener bug")));
    map.add_listener(counting_listener::<MapChange<&str, i32>>(&after));

    assert_eq!(map.put("k", 1), Ok(None));
    assert_eq!(map.get(&"k"), Some(1));
    assert_eq!(after.get(), 1);

    let faults = faults.borrow();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].channel(), ListenerChannel::ElementChange);
    assert_eq!(faults[0].message(), "listener bug");
}

#[test]
fn panicking_invalidation_listener_does_not_block_change_listeners() {
    let fault_count = Rc::new(Cell::new(0));
    let sink = Rc::clone(&fault_count);
    let config = DispatchConfig::new().with_fault_sink(move |_| sink.set(sink.get() + 1));
    let list = ObservableList::with_config(Vec::new(), &config);

    let changes = Rc::new(Cell::new(0));
    list.add_invalidation_listener(Rc::new(|_: &ObservableList<u8>| panic!("invalidation bug")));
    list.add_listener(counting_listener::<ListChange<u8>>(&changes));

    list.add(7).unwrap();
    assert_eq!(fault_count.get(), 1);
    assert_eq!(changes.get(), 1);
}

#[test]
fn invalidation_listener_sees_post_state() {
    let set: ObservableSet<&str> = ObservableSet::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    set.add_invalidation_listener(Rc::new(move |s: &ObservableSet<&str>| {
        sink.borrow_mut().push(s.len());
    }));
    set.add_all(["a", "b"]).unwrap();
    set.remove(&"a").unwrap();
    set.remove(&"zzz").unwrap();
    assert_eq!(*seen.borrow(), vec![2, 1]);
}

#[test]
fn listener_mutating_another_collection() {
    let source = ObservableList::from_vec(vec![1, 2]);
    let mirror = ObservableList::from_vec(vec![1, 2]);
    let target = mirror.clone();
    source.add_listener(Rc::new(move |change: &mut ListChange<i32>| {
        target.set_all(change.list().to_vec()).unwrap();
    }));
    source.insert(0, 0).unwrap();
    source.remove_at(2).unwrap();
    assert_eq!(mirror.to_vec(), vec![0, 1]);
}
