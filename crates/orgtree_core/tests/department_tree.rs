use orgtree_core::db::open_db_in_memory;
use orgtree_core::{
    CreateDepartmentRequest, CreateEmployeeRequest, DeleteDepartmentRequest, DeleteMode,
    DepartmentChanges, DepartmentRepository, DepartmentResponse, DepartmentService,
    DepartmentServiceError, EmployeeRepository, EmployeeService, ErrorKind, GetDepartmentQuery,
    SqliteDepartmentRepository, SqliteEmployeeRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn departments(conn: &Connection) -> DepartmentService<SqliteDepartmentRepository<'_>> {
    DepartmentService::new(SqliteDepartmentRepository::try_new(conn).unwrap())
}

fn employees(
    conn: &Connection,
) -> EmployeeService<SqliteDepartmentRepository<'_>, SqliteEmployeeRepository<'_>> {
    EmployeeService::new(
        SqliteDepartmentRepository::try_new(conn).unwrap(),
        SqliteEmployeeRepository::try_new(conn).unwrap(),
    )
}

fn create(
    service: &DepartmentService<SqliteDepartmentRepository<'_>>,
    name: &str,
    parent_id: Option<i64>,
) -> DepartmentResponse {
    service
        .create_department(&CreateDepartmentRequest {
            name: name.to_string(),
            parent_id,
        })
        .unwrap()
}

fn hire(conn: &Connection, department_id: i64, full_name: &str) {
    employees(conn)
        .create_employee(
            department_id,
            &CreateEmployeeRequest {
                full_name: full_name.to_string(),
                position: "Developer".to_string(),
                hired_at: None,
            },
        )
        .unwrap();
}

fn reparent(parent_id: i64) -> DepartmentChanges {
    DepartmentChanges {
        name: None,
        parent_id: Some(parent_id),
    }
}

fn query(depth: i64, include_employees: bool) -> GetDepartmentQuery {
    GetDepartmentQuery {
        depth,
        include_employees,
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn engineering_backend_example_nests_child_and_employee() {
    let conn = setup();
    let service = departments(&conn);

    let engineering = create(&service, "Engineering", None);
    let backend = create(&service, "Backend", Some(engineering.id));
    assert_eq!(engineering.id, 1);
    assert_eq!(backend.id, 2);

    employees(&conn)
        .create_employee(
            backend.id,
            &CreateEmployeeRequest {
                full_name: "Oleg Moroz".to_string(),
                position: "Developer".to_string(),
                hired_at: Some("2024-01-15".to_string()),
            },
        )
        .unwrap();

    let tree = service.get_department(1, query(2, true)).unwrap();
    assert_eq!(tree.name, "Engineering");
    assert!(tree.employees.is_empty());
    assert_eq!(tree.children.len(), 1);
    let child = &tree.children[0];
    assert_eq!(child.name, "Backend");
    assert_eq!(child.employees.len(), 1);
    assert_eq!(child.employees[0].full_name, "Oleg Moroz");
    assert_eq!(child.employees[0].hired_at.as_deref(), Some("2024-01-15"));
}

#[test]
fn create_then_fetch_round_trips_name_and_parent() {
    let conn = setup();
    let service = departments(&conn);

    let root = create(&service, "  Operations  ", None);
    assert_eq!(root.name, "Operations");
    let child = create(&service, "Logistics", Some(root.id));

    let fetched = service.get_department(child.id, query(1, false)).unwrap();
    assert_eq!(fetched.name, "Logistics");
    assert_eq!(fetched.parent_id, Some(root.id));
    assert_eq!(fetched.created_at, child.created_at);
}

#[test]
fn create_rejects_missing_parent_and_duplicate_sibling() {
    let conn = setup();
    let service = departments(&conn);

    let missing = service
        .create_department(&CreateDepartmentRequest {
            name: "Orphan".to_string(),
            parent_id: Some(404),
        })
        .unwrap_err();
    assert!(matches!(missing, DepartmentServiceError::ParentNotFound(404)));
    assert_eq!(missing.kind(), ErrorKind::ParentNotFound);

    let root = create(&service, "Engineering", None);
    create(&service, "Backend", Some(root.id));
    let duplicate = service
        .create_department(&CreateDepartmentRequest {
            name: " Backend ".to_string(),
            parent_id: Some(root.id),
        })
        .unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::DuplicateName);

    // Same name under another parent is allowed; uniqueness is case-sensitive.
    let other = create(&service, "Sales", None);
    create(&service, "Backend", Some(other.id));
    create(&service, "backend", Some(root.id));
}

#[test]
fn create_rejects_blank_and_oversized_names() {
    let conn = setup();
    let service = departments(&conn);

    let blank = service
        .create_department(&CreateDepartmentRequest {
            name: " \t ".to_string(),
            parent_id: None,
        })
        .unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::EmptyConstraint);

    let too_long = service
        .create_department(&CreateDepartmentRequest {
            name: "n".repeat(201),
            parent_id: None,
        })
        .unwrap_err();
    assert_eq!(too_long.kind(), ErrorKind::LengthConstraint);
    assert_eq!(count(&conn, "departments"), 0);
}

#[test]
fn reparent_under_self_or_any_descendant_is_a_cycle() {
    let conn = setup();
    let service = departments(&conn);

    // chain: a -> b -> c -> d -> e
    let mut chain = vec![create(&service, "a", None).id];
    for name in ["b", "c", "d", "e"] {
        let parent = *chain.last().unwrap();
        chain.push(create(&service, name, Some(parent)).id);
    }

    for (index, &descendant) in chain.iter().enumerate() {
        let err = service
            .update_department(chain[0], &reparent(descendant))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CycleConstraint, "cycle length {index}");
    }

    let middle = chain[2];
    let err = service
        .update_department(middle, &reparent(chain[4]))
        .unwrap_err();
    assert!(matches!(
        err,
        DepartmentServiceError::CycleDetected { department_id, .. } if department_id == middle
    ));

    let unchanged = service.get_department(chain[0], query(1, false)).unwrap();
    assert_eq!(unchanged.parent_id, None);
}

#[test]
fn reparent_to_unrelated_branch_succeeds() {
    let conn = setup();
    let service = departments(&conn);

    let engineering = create(&service, "Engineering", None);
    let backend = create(&service, "Backend", Some(engineering.id));
    let sales = create(&service, "Sales", None);

    let moved = service
        .update_department(backend.id, &reparent(sales.id))
        .unwrap();
    assert_eq!(moved.parent_id, Some(sales.id));

    let sales_tree = service.get_department(sales.id, query(1, false)).unwrap();
    assert_eq!(sales_tree.children.len(), 1);
    assert_eq!(sales_tree.children[0].id, backend.id);
}

#[test]
fn reparent_rejects_missing_parent() {
    let conn = setup();
    let service = departments(&conn);
    let root = create(&service, "Root", None);

    let err = service
        .update_department(root.id, &reparent(999))
        .unwrap_err();
    assert!(matches!(err, DepartmentServiceError::ParentNotFound(999)));
}

#[test]
fn update_checks_effective_sibling_pair() {
    let conn = setup();
    let service = departments(&conn);

    let root = create(&service, "Root", None);
    let other = create(&service, "Other", None);
    let alpha = create(&service, "Alpha", Some(root.id));
    create(&service, "Beta", Some(root.id));
    create(&service, "Alpha", Some(other.id));

    let rename_clash = service
        .update_department(
            alpha.id,
            &DepartmentChanges {
                name: Some("Beta".to_string()),
                parent_id: None,
            },
        )
        .unwrap_err();
    assert_eq!(rename_clash.kind(), ErrorKind::DuplicateName);

    let move_clash = service
        .update_department(alpha.id, &reparent(other.id))
        .unwrap_err();
    assert_eq!(move_clash.kind(), ErrorKind::DuplicateName);

    // Renaming to its current name is not a collision with itself.
    let same = service
        .update_department(
            alpha.id,
            &DepartmentChanges {
                name: Some("Alpha".to_string()),
                parent_id: None,
            },
        )
        .unwrap();
    assert_eq!(same.name, "Alpha");
}

#[test]
fn blank_rename_fails_and_leaves_record_unchanged() {
    let conn = setup();
    let service = departments(&conn);
    let engineering = create(&service, "Engineering", None);

    for blank in ["", "   "] {
        let err = service
            .update_department(
                engineering.id,
                &DepartmentChanges {
                    name: Some(blank.to_string()),
                    parent_id: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyConstraint);
    }

    let fetched = service
        .get_department(engineering.id, query(1, false))
        .unwrap();
    assert_eq!(fetched.name, "Engineering");
}

#[test]
fn empty_update_returns_current_record() {
    let conn = setup();
    let service = departments(&conn);
    let root = create(&service, "Root", None);
    create(&service, "Child", Some(root.id));

    let unchanged = service
        .update_department(root.id, &DepartmentChanges::default())
        .unwrap();
    assert_eq!(unchanged.name, "Root");
    assert!(unchanged.children.is_empty());

    let missing = service
        .update_department(77, &DepartmentChanges::default())
        .unwrap_err();
    assert!(matches!(missing, DepartmentServiceError::DepartmentNotFound(77)));
}

#[test]
fn update_response_includes_direct_children_only() {
    let conn = setup();
    let service = departments(&conn);
    let root = create(&service, "Root", None);
    let child = create(&service, "Child", Some(root.id));
    create(&service, "Grandchild", Some(child.id));
    hire(&conn, root.id, "Ann");

    let updated = service
        .update_department(
            root.id,
            &DepartmentChanges {
                name: Some("Head Office".to_string()),
                parent_id: None,
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Head Office");
    assert!(updated.employees.is_empty());
    assert_eq!(updated.children.len(), 1);
    assert!(updated.children[0].children.is_empty());
}

#[test]
fn depth_bounds_subtree_and_caps_at_five() {
    let conn = setup();
    let service = departments(&conn);

    let mut ids = vec![create(&service, "level0", None).id];
    for level in 1..=7 {
        let parent = *ids.last().unwrap();
        ids.push(create(&service, &format!("level{level}"), Some(parent)).id);
    }

    fn levels(response: &DepartmentResponse) -> usize {
        response
            .children
            .iter()
            .map(|child| 1 + levels(child))
            .max()
            .unwrap_or(0)
    }

    for depth in 1..=5 {
        let tree = service.get_department(ids[0], query(depth, false)).unwrap();
        assert_eq!(levels(&tree), depth as usize);
    }
    let capped = service.get_department(ids[0], query(50, false)).unwrap();
    let five = service.get_department(ids[0], query(5, false)).unwrap();
    assert_eq!(capped, five);

    for invalid in [0, -1] {
        let err = service
            .get_department(ids[0], query(invalid, false))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    let missing = service.get_department(999, query(1, true)).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::DepartmentNotFound);
}

#[test]
fn children_keep_id_order_and_employees_sort_by_name() {
    let conn = setup();
    let service = departments(&conn);
    let root = create(&service, "Root", None);
    let zeta = create(&service, "Zeta", Some(root.id));
    let alpha = create(&service, "Alpha", Some(root.id));
    hire(&conn, root.id, "Yuri");
    hire(&conn, root.id, "Anna");
    hire(&conn, root.id, "Mark");

    let tree = service.get_department(root.id, query(1, true)).unwrap();
    let child_ids: Vec<i64> = tree.children.iter().map(|child| child.id).collect();
    assert_eq!(child_ids, vec![zeta.id, alpha.id]);
    let names: Vec<&str> = tree
        .employees
        .iter()
        .map(|employee| employee.full_name.as_str())
        .collect();
    assert_eq!(names, vec!["Anna", "Mark", "Yuri"]);

    let without = service.get_department(root.id, query(1, false)).unwrap();
    assert!(without.employees.is_empty());
}

#[test]
fn cascade_delete_removes_whole_subtree_and_staff() {
    let conn = setup();
    let service = departments(&conn);

    let root = create(&service, "Root", None);
    let a = create(&service, "A", Some(root.id));
    let b = create(&service, "B", Some(root.id));
    let a1 = create(&service, "A1", Some(a.id));
    let survivor = create(&service, "Survivor", None);
    hire(&conn, root.id, "r1");
    hire(&conn, a.id, "a1");
    hire(&conn, b.id, "b1");
    hire(&conn, a1.id, "a11");
    hire(&conn, a1.id, "a12");
    hire(&conn, survivor.id, "s1");

    service
        .delete_department(root.id, DeleteDepartmentRequest::default())
        .unwrap();

    assert_eq!(count(&conn, "departments"), 1);
    assert_eq!(count(&conn, "employees"), 1);
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    assert!(repo.exists(survivor.id).unwrap());
    assert!(!repo.exists(a1.id).unwrap());
}

#[test]
fn reassign_delete_moves_direct_staff_and_destroys_children() {
    let conn = setup();
    let service = departments(&conn);

    let engineering = create(&service, "Engineering", None);
    let backend = create(&service, "Backend", Some(engineering.id));
    let platform = create(&service, "Platform", Some(backend.id));
    hire(&conn, backend.id, "Oleg Moroz");
    hire(&conn, platform.id, "Nested Person");

    service
        .delete_department(
            backend.id,
            DeleteDepartmentRequest {
                mode: DeleteMode::Reassign,
                reassign_to_id: Some(engineering.id),
            },
        )
        .unwrap();

    let employee_repo = SqliteEmployeeRepository::try_new(&conn).unwrap();
    let moved = employee_repo.list_by_department(engineering.id).unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].full_name, "Oleg Moroz");
    assert_eq!(count(&conn, "employees"), 1);
    assert_eq!(count(&conn, "departments"), 1);
}

#[test]
fn reassign_delete_validates_target() {
    let conn = setup();
    let service = departments(&conn);
    let root = create(&service, "Root", None);
    hire(&conn, root.id, "Ann");

    let missing_target = service
        .delete_department(
            root.id,
            DeleteDepartmentRequest {
                mode: DeleteMode::Reassign,
                reassign_to_id: None,
            },
        )
        .unwrap_err();
    assert_eq!(missing_target.kind(), ErrorKind::InvalidReassignToId);

    let self_target = service
        .delete_department(
            root.id,
            DeleteDepartmentRequest {
                mode: DeleteMode::Reassign,
                reassign_to_id: Some(root.id),
            },
        )
        .unwrap_err();
    assert_eq!(self_target.kind(), ErrorKind::InvalidReassignToId);

    let absent_target = service
        .delete_department(
            root.id,
            DeleteDepartmentRequest {
                mode: DeleteMode::Reassign,
                reassign_to_id: Some(404),
            },
        )
        .unwrap_err();
    assert!(matches!(
        absent_target,
        DepartmentServiceError::DepartmentNotFound(404)
    ));

    assert_eq!(count(&conn, "departments"), 1);
    assert_eq!(count(&conn, "employees"), 1);
}

#[test]
fn delete_missing_department_is_not_found() {
    let conn = setup();
    let service = departments(&conn);

    let err = service
        .delete_department(5, DeleteDepartmentRequest::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DepartmentNotFound);
}

#[test]
fn corrupted_parent_links_stop_the_ancestor_walk() {
    let conn = setup();
    let service = departments(&conn);
    let a = create(&service, "A", None);
    let b = create(&service, "B", Some(a.id));
    let c = create(&service, "C", None);

    conn.execute(
        "UPDATE departments SET parent_id = ?1 WHERE id = ?2;",
        [b.id, a.id],
    )
    .unwrap();

    let err = service.update_department(c.id, &reparent(a.id)).unwrap_err();
    assert!(matches!(err, DepartmentServiceError::CorruptTree { .. }));
    assert_eq!(err.kind(), ErrorKind::Internal);

    let read = service.get_department(a.id, query(5, false)).unwrap_err();
    assert_eq!(read.kind(), ErrorKind::Internal);
}

#[test]
fn reassign_delete_rolls_back_when_delete_fails() {
    let conn = setup();
    let service = departments(&conn);
    let engineering = create(&service, "Engineering", None);
    let backend = create(&service, "Backend", Some(engineering.id));
    hire(&conn, backend.id, "Oleg Moroz");

    conn.execute_batch(
        "CREATE TRIGGER block_department_delete BEFORE DELETE ON departments
         BEGIN SELECT RAISE(ABORT, 'delete blocked'); END;",
    )
    .unwrap();

    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    assert!(repo
        .delete_department_with_reassign(backend.id, engineering.id)
        .is_err());

    assert!(conn.is_autocommit());
    let employee_repo = SqliteEmployeeRepository::try_new(&conn).unwrap();
    assert_eq!(employee_repo.list_by_department(backend.id).unwrap().len(), 1);
    assert!(employee_repo
        .list_by_department(engineering.id)
        .unwrap()
        .is_empty());
    assert!(repo.exists(backend.id).unwrap());
}

#[test]
fn stored_tree_loads_requested_levels_and_staff() {
    let conn = setup();
    let service = departments(&conn);
    let root = create(&service, "Root", None);
    let a = create(&service, "A", Some(root.id));
    let a1 = create(&service, "A1", Some(a.id));
    let a11 = create(&service, "A11", Some(a1.id));
    hire(&conn, a.id, "Ann");
    hire(&conn, a1.id, "Bob");
    hire(&conn, a11.id, "Cid");

    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    let tree = repo.get_department_tree(root.id, 2, true).unwrap();
    assert!(!tree.is_empty());
    assert_eq!(tree.depth(), 2);
    assert!(tree.contains(a1.id));
    assert!(!tree.contains(a11.id));
    assert_eq!(tree.employee_count(), 2);

    let bare = repo.get_department_tree(root.id, 5, false).unwrap();
    assert_eq!(bare.depth(), 3);
    assert_eq!(bare.employee_count(), 0);
}
