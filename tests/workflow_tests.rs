mod common;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use common::Workshop;
use taller_workflow::config::EnvironmentConfig;
use taller_workflow::models::{CarStatus, CarUpdate, NewCar, RepairCorrection, RequestStatus};
use taller_workflow::repositories::{
    CarRepository, MemoryStore, RepairRepository, ServiceRequestRepository,
};
use taller_workflow::services::payment_provider::SimulatedProvider;
use taller_workflow::services::{DirectRepair, DispatchMode, OpenRequest, RequestOutcome};
use taller_workflow::utils::errors::AppError;
use taller_workflow::{AppState, Collaborators};

fn money(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

/// Auto ingresado con una solicitud abierta por el cliente
async fn open_request(workshop: &Workshop, plate: &str) -> RequestOutcome {
    let car = workshop.register_car(plate).await;
    workshop
        .state
        .workflow
        .create_request(
            &Workshop::actor(&workshop.client),
            OpenRequest {
                car_id: car.id,
                description: "Ruido en la suspensión".to_string(),
                preferred_mechanic_id: None,
            },
        )
        .await
        .unwrap()
}

/// Solicitud asignada al mecánico del jefe
async fn assigned_request(workshop: &Workshop, plate: &str) -> RequestOutcome {
    let opened = open_request(workshop, plate).await;
    workshop
        .state
        .workflow
        .assign_mechanic(&Workshop::actor(&workshop.boss), opened.request.id, workshop.mechanic_id())
        .await
        .unwrap()
}

/// Solicitud con presupuesto enviado
async fn budget_sent(workshop: &Workshop, plate: &str) -> RequestOutcome {
    let assigned = assigned_request(workshop, plate).await;
    workshop
        .state
        .workflow
        .send_budget(
            &Workshop::actor(&workshop.mechanic),
            assigned.request.id,
            "Cambio de amortiguadores".to_string(),
            money("150.00"),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_repair_cycle() {
    let workshop = Workshop::new().await;
    let workflow = &workshop.state.workflow;

    // Ingreso y solicitud
    let car = workshop.register_car("abc-123").await;
    assert_eq!(car.license_plate, "ABC123");
    assert_eq!(car.status, CarStatus::Entrada);

    let opened = workflow
        .create_request(
            &Workshop::actor(&workshop.client),
            OpenRequest {
                car_id: car.id,
                description: "Pierde aceite".to_string(),
                preferred_mechanic_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(opened.request.status, RequestStatus::Pending);
    assert_eq!(opened.car.status, CarStatus::Pendiente);
    assert_eq!(opened.request.assigned_boss_id, workshop.boss_id());

    // El jefe asigna a su mecánico
    let assigned = workflow
        .assign_mechanic(&Workshop::actor(&workshop.boss), opened.request.id, workshop.mechanic_id())
        .await
        .unwrap();
    assert_eq!(assigned.request.status, RequestStatus::Assigned);
    assert_eq!(assigned.car.status, CarStatus::EnRevision);
    assert_eq!(assigned.car.mechanic_id, Some(workshop.mechanic_id()));

    // Presupuesto y aceptación
    let budget = workflow
        .send_budget(
            &Workshop::actor(&workshop.mechanic),
            opened.request.id,
            "Cambio de retenes".to_string(),
            money("150.00"),
        )
        .await
        .unwrap();
    assert_eq!(budget.request.status, RequestStatus::BudgetSent);
    assert_eq!(budget.car.status, CarStatus::Pendiente);

    let accepted = workflow
        .accept_budget(&Workshop::actor(&workshop.client), car.id)
        .await
        .unwrap();
    assert_eq!(accepted.request.status, RequestStatus::InRepair);
    assert_eq!(accepted.car.status, CarStatus::EnReparacion);

    // Cierre con costo
    let completed = workflow
        .update_request_status(
            &Workshop::actor(&workshop.mechanic),
            opened.request.id,
            RequestStatus::Completed,
            None,
            Some(money("150.00")),
        )
        .await
        .unwrap();
    assert_eq!(completed.request.status, RequestStatus::Completed);
    assert_eq!(completed.car.status, CarStatus::Finalizado);
    let repair = completed.repair.expect("reparación creada");
    assert_eq!(repair.cost, money("150.00"));
    assert_eq!(repair.description, "Pierde aceite");
    assert_eq!(repair.warranty_days, 90);
    assert_eq!(workshop.store.repairs_for_car(car.id).await.len(), 1);

    // Entrega
    let delivered = workflow
        .deliver_car(&Workshop::actor(&workshop.receptionist), car.id)
        .await
        .unwrap();
    assert_eq!(delivered.status, CarStatus::Entregado);

    let again = workflow
        .deliver_car(&Workshop::actor(&workshop.receptionist), car.id)
        .await;
    assert!(matches!(again, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_client_cancels_pending_request() {
    let workshop = Workshop::new().await;
    let opened = open_request(&workshop, "AB123CD").await;

    let cancelled = workshop
        .state
        .workflow
        .cancel_request(&Workshop::actor(&workshop.client), opened.request.id)
        .await
        .unwrap();
    assert_eq!(cancelled.request.status, RequestStatus::Cancelled);
    assert_eq!(cancelled.car.status, CarStatus::Entrada);

    // El rebote deja el paso intermedio en el historial
    let history = workshop.store.car_history(opened.car.id).await.unwrap();
    let statuses: Vec<CarStatus> = history.iter().map(|change| change.to_status).collect();
    assert_eq!(
        statuses,
        vec![
            CarStatus::Entrada,
            CarStatus::Pendiente,
            CarStatus::Cancelado,
            CarStatus::Entrada
        ]
    );
}

#[tokio::test]
async fn test_reject_budget_ends_at_entrada() {
    let workshop = Workshop::new().await;
    let sent = budget_sent(&workshop, "ABC124").await;

    let rejected = workshop
        .state
        .workflow
        .reject_budget(&Workshop::actor(&workshop.client), sent.car.id)
        .await
        .unwrap();
    assert_eq!(rejected.request.status, RequestStatus::Rejected);
    assert_eq!(rejected.car.status, CarStatus::Entrada);

    let history = workshop.store.car_history(sent.car.id).await.unwrap();
    let tail: Vec<CarStatus> = history.iter().rev().take(2).map(|change| change.to_status).collect();
    assert_eq!(tail, vec![CarStatus::Entrada, CarStatus::Rechazado]);
}

#[tokio::test]
async fn test_budget_actions_need_a_sent_budget() {
    let workshop = Workshop::new().await;
    let assigned = assigned_request(&workshop, "ABC125").await;

    let result = workshop
        .state
        .workflow
        .accept_budget(&Workshop::actor(&workshop.client), assigned.car.id)
        .await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_non_owner_client_is_forbidden() {
    let workshop = Workshop::new().await;
    let workflow = &workshop.state.workflow;
    let stranger = Workshop::actor(&workshop.other_client);
    let sent = budget_sent(&workshop, "ABC126").await;

    assert!(matches!(
        workflow.accept_budget(&stranger, sent.car.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        workflow.reject_budget(&stranger, sent.car.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        workflow.cancel_request(&stranger, sent.request.id).await,
        Err(AppError::Forbidden(_))
    ));

    // Nada cambió
    let car = workshop.store.find_car(sent.car.id).await.unwrap().unwrap();
    assert_eq!(car.status, CarStatus::Pendiente);
}

#[tokio::test]
async fn test_boss_cannot_assign_foreign_mechanic() {
    let workshop = Workshop::new().await;
    let (_, other_boss) = workshop.store.add_boss("Otro", "Jefe", "otro@taller.com").await;
    let (_, foreign) = workshop
        .store
        .add_mechanic("Pedro", "Ajeno", "pedro@taller.com", Some(other_boss.id))
        .await;
    let car = workshop.register_car("ABC127").await;
    let opened = workshop
        .state
        .workflow
        .create_request(
            &Workshop::actor(&workshop.client),
            OpenRequest {
                car_id: car.id,
                description: "Embrague".to_string(),
                preferred_mechanic_id: Some(workshop.mechanic_id()),
            },
        )
        .await
        .unwrap();

    let result = workshop
        .state
        .workflow
        .assign_mechanic(&Workshop::actor(&workshop.boss), opened.request.id, foreign.id)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // Un admin puede asignar cualquier mecánico
    let assigned = workshop
        .state
        .workflow
        .assign_mechanic(&Workshop::actor(&workshop.admin), opened.request.id, foreign.id)
        .await
        .unwrap();
    assert_eq!(assigned.request.assigned_mechanic_id, Some(foreign.id));
}

#[tokio::test]
async fn test_boss_assigning_own_mechanic_on_foreign_request_is_forbidden() {
    let workshop = Workshop::new().await;
    let (other_boss_user, other_boss) = workshop.store.add_boss("Otro", "Jefe", "otro@taller.com").await;
    let (_, other_mechanic) = workshop
        .store
        .add_mechanic("Pedro", "Otro", "pedro@taller.com", Some(other_boss.id))
        .await;
    let car = workshop.register_car("ABC128").await;

    // El mecánico preferido fija el jefe de la solicitud
    let opened = workshop
        .state
        .workflow
        .create_request(
            &Workshop::actor(&workshop.client),
            OpenRequest {
                car_id: car.id,
                description: "Frenos".to_string(),
                preferred_mechanic_id: Some(workshop.mechanic_id()),
            },
        )
        .await
        .unwrap();
    assert_eq!(opened.request.assigned_boss_id, workshop.boss_id());

    let result = workshop
        .state
        .workflow
        .assign_mechanic(&Workshop::actor(&other_boss_user), opened.request.id, other_mechanic.id)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_request_without_bosses_fails() {
    let workshop = Workshop::new().await;
    let store = MemoryStore::new();
    let (client, client_profile) = store.add_client("Ana", "Pérez", None).await;
    let state = AppState::new(
        EnvironmentConfig::for_tests(),
        Collaborators {
            store: Arc::new(store),
            cache: workshop.cache.clone(),
            queue: workshop.queue.clone(),
            provider: Arc::new(SimulatedProvider::new("http://localhost:5173")),
            dispatch: DispatchMode::Inline,
        },
    );
    let actor = Workshop::actor(&client);
    let car = state
        .workflow
        .register_car(
            &actor,
            NewCar {
                license_plate: "AAA111".to_string(),
                brand: "VW".to_string(),
                model: "Gol".to_string(),
                kms: 10,
                chassis: "9BWZZZ377VT004251".to_string(),
                description: None,
                priority: 0,
                client_id: client_profile.id,
            },
        )
        .await
        .unwrap();

    let result = state
        .workflow
        .create_request(
            &actor,
            OpenRequest {
                car_id: car.id,
                description: "Service".to_string(),
                preferred_mechanic_id: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NoBossAvailable)));
}

#[tokio::test]
async fn test_only_one_live_request_per_car() {
    let workshop = Workshop::new().await;
    let opened = open_request(&workshop, "ABC129").await;

    let second = workshop
        .state
        .workflow
        .create_request(
            &Workshop::actor(&workshop.client),
            OpenRequest {
                car_id: opened.car.id,
                description: "Otra cosa".to_string(),
                preferred_mechanic_id: None,
            },
        )
        .await;
    assert!(matches!(second, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_mechanic_not_assigned_cannot_work_request() {
    let workshop = Workshop::new().await;
    let (other_mechanic, _) = workshop
        .store
        .add_mechanic("Otro", "Mecánico", "otro@taller.com", None)
        .await;
    let assigned = assigned_request(&workshop, "ABC130").await;

    let result = workshop
        .state
        .workflow
        .send_budget(
            &Workshop::actor(&other_mechanic),
            assigned.request.id,
            "Presupuesto".to_string(),
            money("10"),
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_negative_budget_is_rejected_before_mutation() {
    let workshop = Workshop::new().await;
    let assigned = assigned_request(&workshop, "ABC131").await;

    let result = workshop
        .state
        .workflow
        .send_budget(
            &Workshop::actor(&workshop.mechanic),
            assigned.request.id,
            "Presupuesto".to_string(),
            money("-1"),
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    let car = workshop.store.find_car(assigned.car.id).await.unwrap().unwrap();
    assert_eq!(car.status, CarStatus::EnRevision);
}

#[tokio::test]
async fn test_completed_without_cost_defaults_to_zero() {
    let workshop = Workshop::new().await;
    let assigned = assigned_request(&workshop, "ABC132").await;
    let mechanic = Workshop::actor(&workshop.mechanic);
    let workflow = &workshop.state.workflow;

    workflow
        .update_request_status(&mechanic, assigned.request.id, RequestStatus::InRepair, None, None)
        .await
        .unwrap();
    let completed = workflow
        .update_request_status(&mechanic, assigned.request.id, RequestStatus::Completed, None, None)
        .await
        .unwrap();

    let repair = completed.repair.unwrap();
    assert_eq!(repair.cost, Decimal::ZERO);
    assert_eq!(repair.mechanic_id, Some(workshop.mechanic_id()));
}

#[tokio::test]
async fn test_notifications_follow_transitions() {
    let workshop = Workshop::new().await;
    budget_sent(&workshop, "ABC133").await;

    // Apertura y asignación notifican el estado; el presupuesto va por su email
    assert_eq!(
        workshop.queue.kinds().await,
        vec!["carStateChange", "carStateChange", "budgetEmail"]
    );
}

#[tokio::test]
async fn test_repair_writes_invalidate_cache() {
    let workshop = Workshop::new().await;
    let car = workshop.register_car("ABC134").await;

    let finished = workshop
        .state
        .workflow
        .finish_repair(&Workshop::actor(&workshop.mechanic), car.id, "Alineación", money("80.50"))
        .await
        .unwrap();
    assert_eq!(finished.car.status, CarStatus::Finalizado);
    assert_eq!(finished.repair.warranty_days, 90);
    assert_eq!(finished.repair.cost, money("80.50"));
    assert_eq!(workshop.cache.invalidated.lock().await.as_slice(), ["repairs"]);

    // Sin pagos asociados se puede borrar
    workshop
        .state
        .workflow
        .delete_repair(&Workshop::actor(&workshop.admin), finished.repair.id)
        .await
        .unwrap();
    assert!(workshop.store.find_repair(finished.repair.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_finish_repair_completes_request_in_repair() {
    let workshop = Workshop::new().await;
    let sent = budget_sent(&workshop, "ABC135").await;
    let workflow = &workshop.state.workflow;
    workflow
        .accept_budget(&Workshop::actor(&workshop.client), sent.car.id)
        .await
        .unwrap();

    let finished = workflow
        .finish_repair(&Workshop::actor(&workshop.mechanic), sent.car.id, "Amortiguadores nuevos", money("150"))
        .await
        .unwrap();
    assert_eq!(finished.car.status, CarStatus::Finalizado);

    let request = workflow
        .list_client_requests(&Workshop::actor(&workshop.client), workshop.client_id())
        .await
        .unwrap()
        .into_iter()
        .find(|detail| detail.request.id == sent.request.id)
        .unwrap();
    assert_eq!(request.request.status, RequestStatus::Completed);
    assert_eq!(request.repair.map(|repair| repair.id), Some(finished.repair.id));
    assert_eq!(workshop.store.repairs_for_car(sent.car.id).await.len(), 1);
}

#[tokio::test]
async fn test_manual_transition_validates_code() {
    let workshop = Workshop::new().await;
    let car = workshop.register_car("ABC136").await;
    let workflow = &workshop.state.workflow;
    let mechanic = Workshop::actor(&workshop.mechanic);

    let moved = workflow
        .manual_transition(&mechanic, car.id, 5, Some("Diagnóstico listo".to_string()))
        .await
        .unwrap();
    assert_eq!(moved.status, CarStatus::EnReparacion);
    assert_eq!(moved.description.as_deref(), Some("Diagnóstico listo"));

    assert!(matches!(
        workflow.manual_transition(&mechanic, car.id, 9, None).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        workflow
            .manual_transition(&Workshop::actor(&workshop.client), car.id, 2, None)
            .await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_car_with_requests_cannot_be_deleted() {
    let workshop = Workshop::new().await;
    let opened = open_request(&workshop, "ABC137").await;
    let admin = Workshop::actor(&workshop.admin);

    assert!(matches!(
        workshop.state.workflow.delete_car(&admin, opened.car.id).await,
        Err(AppError::InvalidState(_))
    ));

    let clean = workshop.register_car("ABC138").await;
    workshop.state.workflow.delete_car(&admin, clean.id).await.unwrap();
    assert!(matches!(
        workshop.state.workflow.get_car(&admin, clean.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_duplicate_plate_conflicts() {
    let workshop = Workshop::new().await;
    workshop.register_car("ABC139").await;

    let result = workshop
        .state
        .workflow
        .register_car(
            &Workshop::actor(&workshop.receptionist),
            NewCar {
                license_plate: "abc 139".to_string(),
                brand: "Ford".to_string(),
                model: "Ka".to_string(),
                kms: 1,
                chassis: "1HGCM82633A004352".to_string(),
                description: None,
                priority: 0,
                client_id: workshop.client_id(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_client_cannot_register_car_for_someone_else() {
    let workshop = Workshop::new().await;
    let result = workshop
        .state
        .workflow
        .register_car(
            &Workshop::actor(&workshop.other_client),
            NewCar {
                license_plate: "ABC140".to_string(),
                brand: "Ford".to_string(),
                model: "Ka".to_string(),
                kms: 1,
                chassis: "1HGCM82633A004352".to_string(),
                description: None,
                priority: 0,
                client_id: workshop.client_id(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_unknown_request_is_not_found() {
    let workshop = Workshop::new().await;
    let result = workshop
        .state
        .workflow
        .cancel_request(&Workshop::actor(&workshop.admin), Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_live_request_on_manually_delivered_car_can_be_cancelled() {
    let workshop = Workshop::new().await;
    let opened = open_request(&workshop, "ABC141").await;
    let workflow = &workshop.state.workflow;
    let client = Workshop::actor(&workshop.client);

    let delivered = workflow
        .manual_transition(&Workshop::actor(&workshop.admin), opened.car.id, 7, None)
        .await
        .unwrap();
    assert_eq!(delivered.status, CarStatus::Entregado);

    let cancelled = workflow.cancel_request(&client, opened.request.id).await.unwrap();
    assert_eq!(cancelled.request.status, RequestStatus::Cancelled);
    assert_eq!(cancelled.car.status, CarStatus::Entrada);

    // El auto vuelve a aceptar solicitudes
    let reopened = workflow
        .create_request(
            &client,
            OpenRequest {
                car_id: opened.car.id,
                description: "Vuelve por el mismo ruido".to_string(),
                preferred_mechanic_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(reopened.car.status, CarStatus::Pendiente);
}

#[tokio::test]
async fn test_finish_repair_refuses_car_with_live_request() {
    let workshop = Workshop::new().await;
    let assigned = assigned_request(&workshop, "ABC142").await;
    let workflow = &workshop.state.workflow;
    let mechanic = Workshop::actor(&workshop.mechanic);

    let result = workflow
        .finish_repair(&mechanic, assigned.car.id, "Cambio de bujes", money("100"))
        .await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));

    let request = workshop.store.find_request(assigned.request.id).await.unwrap().unwrap();
    assert_eq!(request.status, RequestStatus::Assigned);
    assert_eq!(
        workshop.store.find_car(assigned.car.id).await.unwrap().unwrap().status,
        CarStatus::EnRevision
    );
    assert!(workshop.store.repairs_for_car(assigned.car.id).await.is_empty());

    // Por el flujo de la solicitud la reparación se crea una sola vez
    workflow
        .update_request_status(&mechanic, assigned.request.id, RequestStatus::InRepair, None, None)
        .await
        .unwrap();
    workflow
        .update_request_status(
            &mechanic,
            assigned.request.id,
            RequestStatus::Completed,
            Some("Cambio de bujes".to_string()),
            Some(money("50")),
        )
        .await
        .unwrap();
    assert_eq!(workshop.store.repairs_for_car(assigned.car.id).await.len(), 1);
}

#[tokio::test]
async fn test_direct_repair_finishes_the_car() {
    let workshop = Workshop::new().await;
    let car = workshop.register_car("ABC143").await;
    let workflow = &workshop.state.workflow;
    let direct = |car_id, mechanic_id| DirectRepair {
        car_id,
        mechanic_id,
        description: "Cambio de correa".to_string(),
        cost: money("320.00"),
        warranty_days: Some(180),
    };

    assert!(matches!(
        workflow
            .create_repair(&Workshop::actor(&workshop.client), direct(car.id, workshop.mechanic_id()))
            .await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        workflow
            .create_repair(&Workshop::actor(&workshop.boss), direct(car.id, Uuid::new_v4()))
            .await,
        Err(AppError::NotFound(_))
    ));

    let created = workflow
        .create_repair(&Workshop::actor(&workshop.boss), direct(car.id, workshop.mechanic_id()))
        .await
        .unwrap();
    assert_eq!(created.car.status, CarStatus::Finalizado);
    assert_eq!(created.repair.warranty_days, 180);
    assert_eq!(created.repair.mechanic_id, Some(workshop.mechanic_id()));
    assert_eq!(workshop.cache.invalidated.lock().await.as_slice(), ["repairs"]);

    // Con una solicitud abierta la reparación sale del flujo de la solicitud
    let opened = open_request(&workshop, "ABC144").await;
    assert!(matches!(
        workflow
            .create_repair(&Workshop::actor(&workshop.boss), direct(opened.car.id, workshop.mechanic_id()))
            .await,
        Err(AppError::InvalidState(_))
    ));
    assert!(workshop.store.repairs_for_car(opened.car.id).await.is_empty());
}

#[tokio::test]
async fn test_repair_correction_is_limited_to_its_mechanic() {
    let workshop = Workshop::new().await;
    let car = workshop.register_car("ABC145").await;
    let workflow = &workshop.state.workflow;
    let finished = workflow
        .finish_repair(&Workshop::actor(&workshop.mechanic), car.id, "Alineación", money("80"))
        .await
        .unwrap();
    let (stranger, _) = workshop
        .store
        .add_mechanic("Pedro", "Otro", "pedro@taller.com", Some(workshop.boss_id()))
        .await;
    let new_cost = || RepairCorrection {
        cost: Some(money("95.50")),
        ..RepairCorrection::default()
    };

    for outsider in [&stranger, &workshop.receptionist, &workshop.client] {
        assert!(matches!(
            workflow
                .update_repair(&Workshop::actor(outsider), finished.repair.id, new_cost())
                .await,
            Err(AppError::Forbidden(_))
        ));
    }
    assert!(matches!(
        workflow
            .update_repair(
                &Workshop::actor(&workshop.mechanic),
                finished.repair.id,
                RepairCorrection {
                    cost: Some(money("-1")),
                    ..RepairCorrection::default()
                },
            )
            .await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        workflow
            .update_repair(&Workshop::actor(&workshop.admin), finished.repair.id, RepairCorrection::default())
            .await,
        Err(AppError::InvalidInput(_))
    ));

    workshop.cache.invalidated.lock().await.clear();
    let corrected = workflow
        .update_repair(&Workshop::actor(&workshop.mechanic), finished.repair.id, new_cost())
        .await
        .unwrap();
    assert_eq!(corrected.cost, money("95.50"));
    assert_eq!(corrected.description, "Alineación");
    assert_eq!(workshop.cache.invalidated.lock().await.as_slice(), ["repairs"]);

    let by_boss = workflow
        .update_repair(
            &Workshop::actor(&workshop.boss),
            finished.repair.id,
            RepairCorrection {
                warranty_days: Some(30),
                ..RepairCorrection::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_boss.warranty_days, 30);
}

#[tokio::test]
async fn test_mechanic_repair_listing() {
    let workshop = Workshop::new().await;
    let car = workshop.register_car("ABC146").await;
    let workflow = &workshop.state.workflow;
    let finished = workflow
        .finish_repair(&Workshop::actor(&workshop.mechanic), car.id, "Frenos", money("60"))
        .await
        .unwrap();
    let (stranger, _) = workshop
        .store
        .add_mechanic("Pedro", "Otro", "pedro@taller.com", Some(workshop.boss_id()))
        .await;

    let own = workflow
        .list_mechanic_repairs(&Workshop::actor(&workshop.mechanic), workshop.mechanic_id())
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].repair.id, finished.repair.id);
    assert_eq!(own[0].license_plate, "ABC146");

    let for_boss = workflow
        .list_mechanic_repairs(&Workshop::actor(&workshop.boss), workshop.mechanic_id())
        .await
        .unwrap();
    assert_eq!(for_boss.len(), 1);

    assert!(matches!(
        workflow
            .list_mechanic_repairs(&Workshop::actor(&stranger), workshop.mechanic_id())
            .await,
        Err(AppError::Forbidden(_))
    ));
    assert!(workflow
        .list_mechanic_repairs(&Workshop::actor(&workshop.admin), stranger.mechanic_id.unwrap())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_update_car_renormalizes_and_keeps_plates_unique() {
    let workshop = Workshop::new().await;
    let car = workshop.register_car("ABC147").await;
    workshop.register_car("AB147CD").await;
    let workflow = &workshop.state.workflow;
    let receptionist = Workshop::actor(&workshop.receptionist);

    let updated = workflow
        .update_car(
            &receptionist,
            car.id,
            CarUpdate {
                license_plate: Some("ab-999-cd".to_string()),
                chassis: Some(" 9bwzzz377vt004251 ".to_string()),
                kms: Some(43_500),
                ..CarUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.license_plate, "AB999CD");
    assert_eq!(updated.chassis, "9BWZZZ377VT004251");
    assert_eq!(updated.kms, 43_500);
    assert_eq!(updated.brand, "Fiat");
    assert_eq!(updated.status, CarStatus::Entrada);
    assert_eq!(workshop.cache.invalidated.lock().await.as_slice(), ["repairs"]);

    let taken = CarUpdate {
        license_plate: Some("ab 147 cd".to_string()),
        ..CarUpdate::default()
    };
    assert!(matches!(
        workflow.update_car(&receptionist, car.id, taken).await,
        Err(AppError::Conflict(_))
    ));

    let short_chassis = CarUpdate {
        chassis: Some("123".to_string()),
        ..CarUpdate::default()
    };
    assert!(matches!(
        workflow.update_car(&receptionist, car.id, short_chassis).await,
        Err(AppError::InvalidInput(_))
    ));

    assert!(matches!(
        workflow
            .update_car(&Workshop::actor(&workshop.client), car.id, CarUpdate::default())
            .await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        workflow.update_car(&receptionist, Uuid::new_v4(), CarUpdate::default()).await,
        Err(AppError::NotFound(_))
    ));
}
