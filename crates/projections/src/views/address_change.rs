//! Address change view: current address state plus the change facts it emits.
//!
//! The view keeps every live access address, unit address and road name in
//! memory, together with two reverse indices used to fan mutations out to the
//! unit addresses they affect:
//!
//! - access address id to the unit addresses attached to it
//! - road id to the access addresses on it
//!
//! Each applied event produces a group of [`AddressChange`] facts which is
//! sent on an unbounded channel once the event has been fully applied.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccessAddressId, PostCodeId, RoadId, UnitAddressId};
use domain::address::{AccessAddressCreatedData, UnitAddressCreatedData};
use domain::{AccessAddressStatus, AddressEvent, DomainEvent, UnitAddressStatus};
use event_store::{EventEnvelope, SequenceNumber};
use tokio::sync::{RwLock, mpsc};

use crate::change::{AddressChange, ChangeContext};
use crate::convert::access_address::{self, Coordinate};
use crate::convert::{road, unit_address};
use crate::error::ProjectionError;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;
use crate::Result;

/// Sending half of the change output queue.
pub type ChangeSender = mpsc::UnboundedSender<Vec<AddressChange>>;

/// Receiving half of the change output queue.
pub type ChangeReceiver = mpsc::UnboundedReceiver<Vec<AddressChange>>;

/// Current state of an access address.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessAddress {
    pub municipal_code: String,
    pub status: AccessAddressStatus,
    pub road_code: String,
    pub house_number: String,
    pub coordinate: Coordinate,
    pub supplementary_town_name: Option<String>,
    pub plot_id: Option<String>,
    pub road_id: RoadId,
    pub post_code_id: PostCodeId,
}

impl From<&AccessAddressCreatedData> for AccessAddress {
    fn from(data: &AccessAddressCreatedData) -> Self {
        Self {
            municipal_code: data.municipal_code.clone(),
            status: data.status,
            road_code: data.road_code.clone(),
            house_number: data.house_number.clone(),
            coordinate: Coordinate::new(data.east_coordinate, data.north_coordinate),
            supplementary_town_name: data.supplementary_town_name.clone(),
            plot_id: data.plot_id.clone(),
            road_id: data.road_id,
            post_code_id: data.post_code_id,
        }
    }
}

/// Current state of a unit address.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitAddress {
    pub access_address_id: AccessAddressId,
    pub status: UnitAddressStatus,
    pub floor_name: Option<String>,
    pub suite_name: Option<String>,
    pub external_updated: Option<DateTime<Utc>>,
}

impl From<&UnitAddressCreatedData> for UnitAddress {
    fn from(data: &UnitAddressCreatedData) -> Self {
        Self {
            access_address_id: data.access_address_id,
            status: data.status,
            floor_name: data.floor_name.clone(),
            suite_name: data.suite_name.clone(),
            external_updated: data.external_updated,
        }
    }
}

#[derive(Debug, Default)]
struct ViewState {
    access_addresses: HashMap<AccessAddressId, AccessAddress>,
    unit_addresses: HashMap<UnitAddressId, UnitAddress>,
    road_names: HashMap<RoadId, String>,
    unit_addresses_by_access_address: HashMap<AccessAddressId, BTreeSet<UnitAddressId>>,
    access_addresses_by_road: HashMap<RoadId, BTreeSet<AccessAddressId>>,
}

fn unknown(entity: &'static str, id: impl ToString, envelope: &EventEnvelope) -> ProjectionError {
    ProjectionError::UnknownEntity {
        entity,
        id: id.to_string(),
        sequence_number: envelope.sequence_number.as_i64(),
    }
}

/// Deleting an entity the view never held leaves the view unchanged.
fn ignore_unknown_deletion(
    entity: &'static str,
    id: impl std::fmt::Display,
    envelope: &EventEnvelope,
) {
    tracing::warn!(
        entity,
        id = %id,
        sequence_number = %envelope.sequence_number,
        event_id = %envelope.event_id,
        "deletion of unknown entity ignored"
    );
}

fn duplicate(entity: &'static str, id: impl ToString, envelope: &EventEnvelope) -> ProjectionError {
    ProjectionError::DuplicateEntity {
        entity,
        id: id.to_string(),
        sequence_number: envelope.sequence_number.as_i64(),
    }
}

impl ViewState {
    fn apply(&mut self, envelope: &EventEnvelope, event: AddressEvent) -> Result<Vec<AddressChange>> {
        let external_updated = event.external_updated();

        match event {
            AddressEvent::AccessAddressCreated(data) => {
                if self.access_addresses.contains_key(&data.id) {
                    return Err(duplicate("access address", data.id, envelope));
                }
                self.access_addresses
                    .insert(data.id, AccessAddress::from(&data));
                self.unit_addresses_by_access_address
                    .entry(data.id)
                    .or_default();
                self.access_addresses_by_road
                    .entry(data.road_id)
                    .or_default()
                    .insert(data.id);
                Ok(Vec::new())
            }
            AddressEvent::AccessAddressMunicipalCodeChanged(data) => self.change_access_address(
                envelope,
                data.id,
                external_updated,
                |address| address.municipal_code = data.municipal_code,
                |ctx, old, new| {
                    access_address::municipal_code_changed(
                        ctx,
                        &old.municipal_code,
                        &new.municipal_code,
                    )
                },
            ),
            AddressEvent::AccessAddressStatusChanged(data) => self.change_access_address(
                envelope,
                data.id,
                external_updated,
                |address| address.status = data.status,
                |ctx, old, new| access_address::status_changed(ctx, old.status, new.status),
            ),
            AddressEvent::AccessAddressRoadCodeChanged(data) => self.change_access_address(
                envelope,
                data.id,
                external_updated,
                |address| address.road_code = data.road_code,
                |ctx, old, new| {
                    access_address::road_code_changed(ctx, &old.road_code, &new.road_code)
                },
            ),
            AddressEvent::AccessAddressHouseNumberChanged(data) => self.change_access_address(
                envelope,
                data.id,
                external_updated,
                |address| address.house_number = data.house_number,
                |ctx, old, new| {
                    access_address::house_number_changed(ctx, &old.house_number, &new.house_number)
                },
            ),
            AddressEvent::AccessAddressSupplementaryTownNameChanged(data) => self
                .change_access_address(
                    envelope,
                    data.id,
                    external_updated,
                    |address| address.supplementary_town_name = data.supplementary_town_name,
                    |ctx, old, new| {
                        access_address::supplementary_town_name_changed(
                            ctx,
                            old.supplementary_town_name.as_deref(),
                            new.supplementary_town_name.as_deref(),
                        )
                    },
                ),
            AddressEvent::AccessAddressPlotIdChanged(data) => self.change_access_address(
                envelope,
                data.id,
                external_updated,
                |address| address.plot_id = data.plot_id,
                |ctx, old, new| {
                    access_address::plot_id_changed(
                        ctx,
                        old.plot_id.as_deref(),
                        new.plot_id.as_deref(),
                    )
                },
            ),
            AddressEvent::AccessAddressPostCodeIdChanged(data) => self.change_access_address(
                envelope,
                data.id,
                external_updated,
                |address| address.post_code_id = data.post_code_id,
                |ctx, old, new| {
                    access_address::post_code_id_changed(ctx, old.post_code_id, new.post_code_id)
                },
            ),
            AddressEvent::AccessAddressCoordinateChanged(data) => self.change_access_address(
                envelope,
                data.id,
                external_updated,
                |address| {
                    address.coordinate = Coordinate::new(data.east_coordinate, data.north_coordinate)
                },
                |ctx, old, new| access_address::coordinate_changed(ctx, old.coordinate, new.coordinate),
            ),
            AddressEvent::AccessAddressRoadIdChanged(data) => {
                self.change_access_address_road(envelope, data.id, data.road_id, external_updated)
            }
            AddressEvent::AccessAddressDeleted(data) => {
                self.delete_access_address(envelope, data.id, external_updated)
            }
            AddressEvent::UnitAddressCreated(data) => self.create_unit_address(envelope, &data),
            AddressEvent::UnitAddressAccessAddressIdChanged(data) => {
                self.move_unit_address(envelope, data.id, data.access_address_id, external_updated)
            }
            AddressEvent::UnitAddressStatusChanged(data) => self.change_unit_address(
                envelope,
                data.id,
                external_updated,
                |address| address.status = data.status,
                |ctx, old, new| unit_address::status_changed(ctx, old.status, new.status),
            ),
            AddressEvent::UnitAddressFloorNameChanged(data) => self.change_unit_address(
                envelope,
                data.id,
                external_updated,
                |address| address.floor_name = data.floor_name,
                |ctx, old, new| {
                    unit_address::floor_name_changed(
                        ctx,
                        old.floor_name.as_deref(),
                        new.floor_name.as_deref(),
                    )
                },
            ),
            AddressEvent::UnitAddressSuiteNameChanged(data) => self.change_unit_address(
                envelope,
                data.id,
                external_updated,
                |address| address.suite_name = data.suite_name,
                |ctx, old, new| {
                    unit_address::suite_name_changed(
                        ctx,
                        old.suite_name.as_deref(),
                        new.suite_name.as_deref(),
                    )
                },
            ),
            AddressEvent::UnitAddressDeleted(data) => {
                self.delete_unit_address(envelope, data.id, external_updated)
            }
            AddressEvent::RoadCreated(data) => {
                if self.road_names.contains_key(&data.id) {
                    return Err(duplicate("road", data.id, envelope));
                }
                self.road_names.insert(data.id, data.name);
                Ok(Vec::new())
            }
            AddressEvent::RoadNameChanged(data) => {
                self.rename_road(envelope, data.id, data.name, external_updated)
            }
            AddressEvent::RoadDeleted(data) => {
                self.delete_road(envelope, data.id)?;
                Ok(Vec::new())
            }
        }
    }

    /// Builds one fact per unit address attached to `access_address_id`.
    fn fan_out(
        &self,
        envelope: &EventEnvelope,
        access_address_id: AccessAddressId,
        external_updated: Option<DateTime<Utc>>,
        mut convert: impl FnMut(&ChangeContext) -> AddressChange,
    ) -> Vec<AddressChange> {
        let mut unit_addresses = self
            .unit_addresses_by_access_address
            .get(&access_address_id)
            .into_iter()
            .flatten()
            .copied();
        let Some(first) = unit_addresses.next() else {
            return Vec::new();
        };

        let ctx = ChangeContext::new(envelope, first, external_updated);
        std::iter::once(ctx)
            .chain(unit_addresses.map(|unit_address_id| ctx.for_unit_address(unit_address_id)))
            .map(|ctx| convert(&ctx))
            .collect()
    }

    fn change_access_address(
        &mut self,
        envelope: &EventEnvelope,
        id: AccessAddressId,
        external_updated: Option<DateTime<Utc>>,
        update: impl FnOnce(&mut AccessAddress),
        convert: impl Fn(&ChangeContext, &AccessAddress, &AccessAddress) -> AddressChange,
    ) -> Result<Vec<AddressChange>> {
        let current = self
            .access_addresses
            .get(&id)
            .ok_or_else(|| unknown("access address", id, envelope))?;

        let mut updated = current.clone();
        update(&mut updated);

        let changes = self.fan_out(envelope, id, external_updated, |ctx| {
            convert(ctx, current, &updated)
        });

        self.access_addresses.insert(id, updated);
        Ok(changes)
    }

    fn change_access_address_road(
        &mut self,
        envelope: &EventEnvelope,
        id: AccessAddressId,
        road_id: RoadId,
        external_updated: Option<DateTime<Utc>>,
    ) -> Result<Vec<AddressChange>> {
        let current = self
            .access_addresses
            .get(&id)
            .ok_or_else(|| unknown("access address", id, envelope))?;
        let old_road_id = current.road_id;

        let old_name = self.road_names.get(&old_road_id).map(String::as_str);
        let new_name = self.road_names.get(&road_id).map(String::as_str);

        let mut changes = Vec::new();
        for change in self.fan_out(envelope, id, external_updated, |ctx| {
            access_address::road_id_changed(ctx, old_road_id, road_id)
        }) {
            let unit_address_id = change.unit_address_id;
            changes.push(change);
            if old_name != new_name {
                let ctx = ChangeContext::new(envelope, unit_address_id, external_updated);
                changes.push(access_address::road_name_changed(&ctx, old_name, new_name));
            }
        }

        if let Some(address) = self.access_addresses.get_mut(&id) {
            address.road_id = road_id;
        }
        self.unindex_from_road(old_road_id, id);
        self.access_addresses_by_road
            .entry(road_id)
            .or_default()
            .insert(id);

        Ok(changes)
    }

    fn unindex_from_road(&mut self, road_id: RoadId, access_address_id: AccessAddressId) {
        if let Some(access_addresses) = self.access_addresses_by_road.get_mut(&road_id) {
            access_addresses.remove(&access_address_id);
            if access_addresses.is_empty() {
                self.access_addresses_by_road.remove(&road_id);
            }
        }
    }

    fn delete_access_address(
        &mut self,
        envelope: &EventEnvelope,
        id: AccessAddressId,
        external_updated: Option<DateTime<Utc>>,
    ) -> Result<Vec<AddressChange>> {
        let Some(road_id) = self.access_addresses.get(&id).map(|address| address.road_id) else {
            ignore_unknown_deletion("access address", id, envelope);
            return Ok(Vec::new());
        };

        let changes = self.fan_out(envelope, id, external_updated, access_address::deleted);

        self.unindex_from_road(road_id, id);
        self.access_addresses.remove(&id);
        self.unit_addresses_by_access_address.remove(&id);

        Ok(changes)
    }

    fn create_unit_address(
        &mut self,
        envelope: &EventEnvelope,
        data: &UnitAddressCreatedData,
    ) -> Result<Vec<AddressChange>> {
        if self.unit_addresses.contains_key(&data.id) {
            return Err(duplicate("unit address", data.id, envelope));
        }

        self.unit_addresses.insert(data.id, UnitAddress::from(data));
        self.index_unit_address(envelope, data.id, data.access_address_id);

        let ctx = ChangeContext::new(envelope, data.id, data.external_updated);
        Ok(vec![unit_address::created(&ctx)])
    }

    /// Attaches a unit address to its access address, if that one is known.
    fn index_unit_address(
        &mut self,
        envelope: &EventEnvelope,
        unit_address_id: UnitAddressId,
        access_address_id: AccessAddressId,
    ) {
        match self
            .unit_addresses_by_access_address
            .get_mut(&access_address_id)
        {
            Some(unit_addresses) => {
                unit_addresses.insert(unit_address_id);
            }
            None => {
                tracing::warn!(
                    %unit_address_id,
                    %access_address_id,
                    sequence_number = %envelope.sequence_number,
                    "unit address references unknown access address, not indexed"
                );
            }
        }
    }

    fn change_unit_address(
        &mut self,
        envelope: &EventEnvelope,
        id: UnitAddressId,
        external_updated: Option<DateTime<Utc>>,
        update: impl FnOnce(&mut UnitAddress),
        convert: impl FnOnce(&ChangeContext, &UnitAddress, &UnitAddress) -> AddressChange,
    ) -> Result<Vec<AddressChange>> {
        let current = self
            .unit_addresses
            .get(&id)
            .ok_or_else(|| unknown("unit address", id, envelope))?;

        let mut updated = current.clone();
        update(&mut updated);
        updated.external_updated = external_updated;

        let ctx = ChangeContext::new(envelope, id, external_updated);
        let change = convert(&ctx, current, &updated);

        self.unit_addresses.insert(id, updated);
        Ok(vec![change])
    }

    fn move_unit_address(
        &mut self,
        envelope: &EventEnvelope,
        id: UnitAddressId,
        access_address_id: AccessAddressId,
        external_updated: Option<DateTime<Utc>>,
    ) -> Result<Vec<AddressChange>> {
        let old_access_address_id = self
            .unit_addresses
            .get(&id)
            .map(|address| address.access_address_id)
            .ok_or_else(|| unknown("unit address", id, envelope))?;

        let changes = self.change_unit_address(
            envelope,
            id,
            external_updated,
            |address| address.access_address_id = access_address_id,
            |ctx, old, new| {
                unit_address::access_address_id_changed(
                    ctx,
                    old.access_address_id,
                    new.access_address_id,
                )
            },
        )?;

        if let Some(unit_addresses) = self
            .unit_addresses_by_access_address
            .get_mut(&old_access_address_id)
        {
            unit_addresses.remove(&id);
        }
        self.index_unit_address(envelope, id, access_address_id);

        Ok(changes)
    }

    fn delete_unit_address(
        &mut self,
        envelope: &EventEnvelope,
        id: UnitAddressId,
        external_updated: Option<DateTime<Utc>>,
    ) -> Result<Vec<AddressChange>> {
        let Some(removed) = self.unit_addresses.remove(&id) else {
            ignore_unknown_deletion("unit address", id, envelope);
            return Ok(Vec::new());
        };

        // The access address may already be gone when deletions arrive out of order.
        if let Some(unit_addresses) = self
            .unit_addresses_by_access_address
            .get_mut(&removed.access_address_id)
        {
            unit_addresses.remove(&id);
        }

        let ctx = ChangeContext::new(envelope, id, external_updated);
        Ok(vec![unit_address::deleted(&ctx)])
    }

    fn rename_road(
        &mut self,
        envelope: &EventEnvelope,
        id: RoadId,
        name: String,
        external_updated: Option<DateTime<Utc>>,
    ) -> Result<Vec<AddressChange>> {
        let old_name = self
            .road_names
            .get(&id)
            .ok_or_else(|| unknown("road", id, envelope))?;

        let mut changes = Vec::new();
        for access_address_id in self.access_addresses_by_road.get(&id).into_iter().flatten() {
            changes.extend(self.fan_out(envelope, *access_address_id, external_updated, |ctx| {
                road::name_changed(ctx, Some(old_name.as_str()), &name)
            }));
        }

        self.road_names.insert(id, name);
        Ok(changes)
    }

    fn delete_road(&mut self, envelope: &EventEnvelope, id: RoadId) -> Result<()> {
        if !self.road_names.contains_key(&id) {
            ignore_unknown_deletion("road", id, envelope);
            return Ok(());
        }

        let referenced = self
            .access_addresses_by_road
            .get(&id)
            .map_or(0, BTreeSet::len);

        if referenced > 0 {
            tracing::warn!(
                road_id = %id,
                access_addresses = referenced,
                sequence_number = %envelope.sequence_number,
                "road deleted while still referenced, keeping its name"
            );
        } else {
            self.road_names.remove(&id);
            self.access_addresses_by_road.remove(&id);
        }
        Ok(())
    }
}

/// Projection that maintains the address view and emits change facts.
///
/// Events on streams other than access addresses, unit addresses and roads
/// are skipped. Any failure to apply an address event is fatal.
#[derive(Clone)]
pub struct AddressChangeProjection {
    state: Arc<RwLock<ViewState>>,
    position: Arc<RwLock<ProjectionPosition>>,
    output: ChangeSender,
}

impl AddressChangeProjection {
    /// Creates a projection together with the receiving end of its output queue.
    pub fn new() -> (Self, ChangeReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::with_output(sender), receiver)
    }

    /// Creates a projection that sends its fact groups to `output`.
    pub fn with_output(output: ChangeSender) -> Self {
        Self {
            state: Arc::new(RwLock::new(ViewState::default())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
            output,
        }
    }

    /// Gets the current state of an access address.
    pub async fn access_address(&self, id: AccessAddressId) -> Option<AccessAddress> {
        self.state.read().await.access_addresses.get(&id).cloned()
    }

    /// Gets the current state of a unit address.
    pub async fn unit_address(&self, id: UnitAddressId) -> Option<UnitAddress> {
        self.state.read().await.unit_addresses.get(&id).cloned()
    }

    /// Gets the current name of a road.
    pub async fn road_name(&self, id: RoadId) -> Option<String> {
        self.state.read().await.road_names.get(&id).cloned()
    }

    /// Gets the unit addresses attached to an access address, in id order.
    pub async fn unit_addresses_at(&self, id: AccessAddressId) -> Vec<UnitAddressId> {
        self.state
            .read()
            .await
            .unit_addresses_by_access_address
            .get(&id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Gets the access addresses on a road, in id order.
    pub async fn access_addresses_on(&self, id: RoadId) -> Vec<AccessAddressId> {
        self.state
            .read()
            .await
            .access_addresses_by_road
            .get(&id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn access_address_count(&self) -> usize {
        self.state.read().await.access_addresses.len()
    }

    pub async fn unit_address_count(&self) -> usize {
        self.state.read().await.unit_addresses.len()
    }

    pub async fn road_count(&self) -> usize {
        self.state.read().await.road_names.len()
    }

    fn decode(envelope: &EventEnvelope) -> Result<AddressEvent> {
        let unexpected = || ProjectionError::UnexpectedEvent {
            event_type: envelope.event_type.clone(),
            sequence_number: envelope.sequence_number.as_i64(),
        };

        if !AddressEvent::is_known_event_type(&envelope.event_type) {
            return Err(unexpected());
        }

        let event = AddressEvent::from_envelope(envelope).map_err(|source| {
            ProjectionError::Deserialization {
                sequence_number: envelope.sequence_number.as_i64(),
                source,
            }
        })?;

        if event.event_type() != envelope.event_type {
            return Err(unexpected());
        }
        Ok(event)
    }

    async fn advance(&self, sequence_number: SequenceNumber) {
        let mut pos = self.position.write().await;
        *pos = pos.advance(sequence_number);
    }
}

#[async_trait]
impl Projection for AddressChangeProjection {
    fn name(&self) -> &'static str {
        "AddressChangeProjection"
    }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<()> {
        if !AddressEvent::is_address_aggregate(&envelope.aggregate_type) {
            self.advance(envelope.sequence_number).await;
            return Ok(());
        }

        let event = Self::decode(envelope)?;

        let changes = {
            let mut state = self.state.write().await;
            state.apply(envelope, event)?
        };

        tracing::debug!(
            sequence_number = %envelope.sequence_number,
            event_id = %envelope.event_id,
            event_type = %envelope.event_type,
            count = changes.len(),
            "applied address event"
        );

        if !changes.is_empty() {
            self.output
                .send(changes)
                .map_err(|_| ProjectionError::OutputClosed)?;
        }

        self.advance(envelope.sequence_number).await;
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = ViewState::default();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for AddressChangeProjection {
    fn name(&self) -> &'static str {
        "AddressChangeProjection"
    }

    fn count(&self) -> usize {
        // Unit addresses tracked; 0 while an event is being applied.
        self.state
            .try_read()
            .map(|state| state.unit_addresses.len())
            .unwrap_or(0)
    }
}
