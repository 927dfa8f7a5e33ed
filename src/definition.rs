//! Plugin definition helpers (spec §4.6).
//!
//! Builder records an implementer fills in with schema values and callbacks, satisfying
//! a capability trait with minimal boilerplate instead of hand-writing an `impl` block.
//! A callback left unset produces [`Error::MissingDefinitionCallback`] the first time the
//! corresponding operation is invoked, naming the missing operation.
//!
//! [`ProviderPluginDefinition`] aggregates definitions of every kind under one namespace
//! and satisfies [`crate::provider::Provider`] directly, the common case for a plugin
//! author who wants to describe a whole namespace declaratively rather than writing five
//! separate capability `impl`s.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::capability::custom_variable_type::CustomVariableTypeCapability;
use crate::capability::data_source::DataSourceCapability;
use crate::capability::function::{FunctionCapability, FunctionDefinition as FunctionSignature};
use crate::capability::link::{
    LinkCapability, LinkKind, LinkStageChangesInput, LinkUpdateEndpointInput,
    LinkUpdateIntermediaryInput,
};
use crate::capability::resource::{DeployInput, ResourceCapability, StageChangesInput};
use crate::deploy_service::DeployService;
use crate::error::{Error, Result};
use crate::identifier::link_id;
use crate::provider::Provider;
use crate::retry::RetryPolicy;
use crate::schema::{Changes, CustomVariableOption, LinkChanges, SchemaNode};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type Callback<A, T> = Arc<dyn Fn(A) -> BoxFuture<Result<T>> + Send + Sync>;
type NullaryCallback<T> = Arc<dyn Fn() -> BoxFuture<Result<T>> + Send + Sync>;

fn missing(item_type: &str, operation: &'static str) -> Error {
    Error::MissingDefinitionCallback {
        item_type: item_type.to_string(),
        operation,
    }
}

/// Builder satisfying [`ResourceCapability`] from user-supplied callbacks.
pub struct ResourceDefinition {
    item_type: String,
    type_description: String,
    is_common_terminal: bool,
    retry_policy: Option<RetryPolicy>,
    custom_validate: Option<Callback<Value, Vec<String>>>,
    get_spec_definition: Option<NullaryCallback<SchemaNode>>,
    get_state_definition: Option<NullaryCallback<SchemaNode>>,
    can_link_to: Option<Callback<String, bool>>,
    stage_changes: Option<Callback<StageChangesInput, Changes>>,
    deploy: Option<Callback<DeployInput, Value>>,
    get_external_state: Option<Callback<Value, Value>>,
    has_stabilised: Option<Callback<Value, bool>>,
    destroy: Option<Callback<Value, bool>>,
}

impl ResourceDefinition {
    /// Starts a definition for `item_type` with every callback unset.
    #[must_use]
    pub fn new(item_type: impl Into<String>, type_description: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            type_description: type_description.into(),
            is_common_terminal: false,
            retry_policy: None,
            custom_validate: None,
            get_spec_definition: None,
            get_state_definition: None,
            can_link_to: None,
            stage_changes: None,
            deploy: None,
            get_external_state: None,
            has_stabilised: None,
            destroy: None,
        }
    }

    /// Marks this resource type as a common terminal (spec glossary).
    #[must_use]
    pub fn common_terminal(mut self, is_common_terminal: bool) -> Self {
        self.is_common_terminal = is_common_terminal;
        self
    }

    /// Sets the retry policy this resource type prefers.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Supplies the `custom_validate` callback.
    #[must_use]
    pub fn with_custom_validate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<String>>> + Send + 'static,
    {
        self.custom_validate = Some(Arc::new(move |spec| Box::pin(f(spec))));
        self
    }

    /// Supplies the `get_spec_definition` callback.
    #[must_use]
    pub fn with_spec_definition<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SchemaNode>> + Send + 'static,
    {
        self.get_spec_definition = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Supplies the `get_state_definition` callback.
    #[must_use]
    pub fn with_state_definition<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SchemaNode>> + Send + 'static,
    {
        self.get_state_definition = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Supplies the `can_link_to` callback.
    #[must_use]
    pub fn with_can_link_to<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.can_link_to = Some(Arc::new(move |other_type| Box::pin(f(other_type))));
        self
    }

    /// Supplies the `stage_changes` callback.
    #[must_use]
    pub fn with_stage_changes<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(StageChangesInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Changes>> + Send + 'static,
    {
        self.stage_changes = Some(Arc::new(move |input| Box::pin(f(input))));
        self
    }

    /// Supplies the `deploy` callback.
    #[must_use]
    pub fn with_deploy<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(DeployInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.deploy = Some(Arc::new(move |input| Box::pin(f(input))));
        self
    }

    /// Supplies the `get_external_state` callback.
    #[must_use]
    pub fn with_get_external_state<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.get_external_state = Some(Arc::new(move |id| Box::pin(f(id))));
        self
    }

    /// Supplies the `has_stabilised` callback.
    #[must_use]
    pub fn with_has_stabilised<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.has_stabilised = Some(Arc::new(move |state| Box::pin(f(state))));
        self
    }

    /// Supplies the `destroy` callback.
    #[must_use]
    pub fn with_destroy<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        self.destroy = Some(Arc::new(move |state| Box::pin(f(state))));
        self
    }
}

#[async_trait]
impl ResourceCapability for ResourceDefinition {
    fn get_type(&self) -> &str {
        &self.item_type
    }

    fn type_description(&self) -> &str {
        &self.type_description
    }

    async fn custom_validate(&self, spec: &Value) -> Result<Vec<String>> {
        match &self.custom_validate {
            Some(f) => f(spec.clone()).await,
            None => Ok(vec![]),
        }
    }

    async fn get_spec_definition(&self) -> Result<SchemaNode> {
        match &self.get_spec_definition {
            Some(f) => f().await,
            None => Err(missing(&self.item_type, "get_spec_definition")),
        }
    }

    async fn get_state_definition(&self) -> Result<SchemaNode> {
        match &self.get_state_definition {
            Some(f) => f().await,
            None => Err(missing(&self.item_type, "get_state_definition")),
        }
    }

    async fn can_link_to(&self, other_type: &str) -> Result<bool> {
        match &self.can_link_to {
            Some(f) => f(other_type.to_string()).await,
            None => Ok(false),
        }
    }

    fn is_common_terminal(&self) -> bool {
        self.is_common_terminal
    }

    async fn stage_changes(&self, input: StageChangesInput) -> Result<Changes> {
        match &self.stage_changes {
            Some(f) => f(input).await,
            None => Err(missing(&self.item_type, "stage_changes")),
        }
    }

    async fn deploy(&self, input: DeployInput) -> Result<Value> {
        match &self.deploy {
            Some(f) => f(input).await,
            None => Err(missing(&self.item_type, "deploy")),
        }
    }

    async fn get_external_state(&self, external_id: &Value) -> Result<Value> {
        match &self.get_external_state {
            Some(f) => f(external_id.clone()).await,
            None => Err(missing(&self.item_type, "get_external_state")),
        }
    }

    async fn has_stabilised(&self, external_state: &Value) -> Result<bool> {
        match &self.has_stabilised {
            Some(f) => f(external_state.clone()).await,
            None => Ok(true),
        }
    }

    async fn destroy(&self, external_state: &Value) -> Result<bool> {
        match &self.destroy {
            Some(f) => f(external_state.clone()).await,
            None => Err(missing(&self.item_type, "destroy")),
        }
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry_policy
    }
}

/// Builder satisfying [`DataSourceCapability`] from user-supplied callbacks.
pub struct DataSourceDefinition {
    item_type: String,
    type_description: String,
    retry_policy: Option<RetryPolicy>,
    custom_validate: Option<Callback<Value, Vec<String>>>,
    get_spec_definition: Option<NullaryCallback<SchemaNode>>,
    get_filter_fields: Option<NullaryCallback<Vec<String>>>,
    fetch: Option<Callback<Value, Value>>,
}

impl DataSourceDefinition {
    /// Starts a definition for `item_type` with every callback unset.
    #[must_use]
    pub fn new(item_type: impl Into<String>, type_description: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            type_description: type_description.into(),
            retry_policy: None,
            custom_validate: None,
            get_spec_definition: None,
            get_filter_fields: None,
            fetch: None,
        }
    }

    /// Sets the retry policy this data source prefers.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Supplies the `custom_validate` callback.
    #[must_use]
    pub fn with_custom_validate<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<String>>> + Send + 'static,
    {
        self.custom_validate = Some(Arc::new(move |spec| Box::pin(f(spec))));
        self
    }

    /// Supplies the `get_spec_definition` callback.
    #[must_use]
    pub fn with_spec_definition<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SchemaNode>> + Send + 'static,
    {
        self.get_spec_definition = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Supplies the `get_filter_fields` callback.
    #[must_use]
    pub fn with_filter_fields<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<String>>> + Send + 'static,
    {
        self.get_filter_fields = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Supplies the `fetch` callback.
    #[must_use]
    pub fn with_fetch<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.fetch = Some(Arc::new(move |filter| Box::pin(f(filter))));
        self
    }
}

#[async_trait]
impl DataSourceCapability for DataSourceDefinition {
    fn get_type(&self) -> &str {
        &self.item_type
    }

    fn type_description(&self) -> &str {
        &self.type_description
    }

    async fn custom_validate(&self, spec: &Value) -> Result<Vec<String>> {
        match &self.custom_validate {
            Some(f) => f(spec.clone()).await,
            None => Ok(vec![]),
        }
    }

    async fn get_spec_definition(&self) -> Result<SchemaNode> {
        match &self.get_spec_definition {
            Some(f) => f().await,
            None => Err(missing(&self.item_type, "get_spec_definition")),
        }
    }

    async fn get_filter_fields(&self) -> Result<Vec<String>> {
        match &self.get_filter_fields {
            Some(f) => f().await,
            None => Ok(vec![]),
        }
    }

    async fn fetch(&self, filter: &Value) -> Result<Value> {
        match &self.fetch {
            Some(f) => f(filter.clone()).await,
            None => Err(missing(&self.item_type, "fetch")),
        }
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry_policy
    }
}

/// Builder satisfying [`CustomVariableTypeCapability`] from user-supplied callbacks.
pub struct CustomVariableTypeDefinition {
    item_type: String,
    description: String,
    enumerate_options: Option<NullaryCallback<Vec<CustomVariableOption>>>,
}

impl CustomVariableTypeDefinition {
    /// Starts a definition for `item_type`.
    #[must_use]
    pub fn new(item_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            description: description.into(),
            enumerate_options: None,
        }
    }

    /// Supplies the `enumerate_options` callback.
    #[must_use]
    pub fn with_enumerate_options<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<CustomVariableOption>>> + Send + 'static,
    {
        self.enumerate_options = Some(Arc::new(move || Box::pin(f())));
        self
    }
}

#[async_trait]
impl CustomVariableTypeCapability for CustomVariableTypeDefinition {
    fn get_type(&self) -> &str {
        &self.item_type
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn enumerate_options(&self) -> Result<Vec<CustomVariableOption>> {
        match &self.enumerate_options {
            Some(f) => f().await,
            None => Err(missing(&self.item_type, "enumerate_options")),
        }
    }
}

/// Builder satisfying [`FunctionCapability`] from a user-supplied callback.
pub struct FunctionPluginDefinition {
    name: String,
    parameters: Vec<String>,
    variadic: bool,
    return_description: String,
    call: Option<Callback<Vec<Value>, Value>>,
}

impl FunctionPluginDefinition {
    /// Starts a definition for `name` with no parameters and no callback.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            variadic: false,
            return_description: String::new(),
            call: None,
        }
    }

    /// Describes each positional parameter, in order.
    #[must_use]
    pub fn parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Marks the final parameter as variadic.
    #[must_use]
    pub fn variadic(mut self, variadic: bool) -> Self {
        self.variadic = variadic;
        self
    }

    /// Describes the return value.
    #[must_use]
    pub fn return_description(mut self, description: impl Into<String>) -> Self {
        self.return_description = description.into();
        self
    }

    /// Supplies the `call` callback.
    #[must_use]
    pub fn with_call<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.call = Some(Arc::new(move |args| Box::pin(f(args))));
        self
    }
}

#[async_trait]
impl FunctionCapability for FunctionPluginDefinition {
    fn get_definition(&self) -> FunctionSignature {
        FunctionSignature {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            variadic: self.variadic,
            return_description: self.return_description.clone(),
        }
    }

    async fn call(&self, args: Vec<Value>) -> Result<Value> {
        match &self.call {
            Some(f) => f(args).await,
            None => Err(missing(&self.name, "call")),
        }
    }
}

/// Builder satisfying [`LinkCapability`] from user-supplied callbacks.
pub struct LinkDefinition {
    type_a: String,
    type_b: String,
    link_type: String,
    kind: LinkKind,
    priority_resource_type: String,
    stage_changes: Option<Callback<LinkStageChangesInput, LinkChanges>>,
    update_resource_a: Option<Callback<LinkUpdateEndpointInput, Value>>,
    update_resource_b: Option<Callback<LinkUpdateEndpointInput, Value>>,
    update_intermediary_resources:
        Option<Arc<dyn Fn(LinkUpdateIntermediaryInput, Arc<DeployService>) -> BoxFuture<Result<Value>> + Send + Sync>>,
    handle_a_error: Option<Callback<LinkUpdateEndpointInput, ()>>,
    handle_b_error: Option<Callback<LinkUpdateEndpointInput, ()>>,
}

impl LinkDefinition {
    /// Starts a definition for the ordered pair `(type_a, type_b)`.
    #[must_use]
    pub fn new(type_a: impl Into<String>, type_b: impl Into<String>, kind: LinkKind) -> Self {
        let type_a = type_a.into();
        let type_b = type_b.into();
        let link_type = link_id(&type_a, &type_b);
        Self {
            type_a,
            type_b,
            link_type,
            kind,
            priority_resource_type: String::new(),
            stage_changes: None,
            update_resource_a: None,
            update_resource_b: None,
            update_intermediary_resources: None,
            handle_a_error: None,
            handle_b_error: None,
        }
    }

    /// Sets the resource type that must deploy first, for a hard link.
    #[must_use]
    pub fn priority_resource_type(mut self, item_type: impl Into<String>) -> Self {
        self.priority_resource_type = item_type.into();
        self
    }

    /// This link's `"<typeA>::<typeB>"` type string.
    #[must_use]
    pub fn link_type(&self) -> &str {
        &self.link_type
    }

    /// Supplies the `stage_changes` callback.
    #[must_use]
    pub fn with_stage_changes<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LinkStageChangesInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LinkChanges>> + Send + 'static,
    {
        self.stage_changes = Some(Arc::new(move |input| Box::pin(f(input))));
        self
    }

    /// Supplies the `update_resource_a` callback.
    #[must_use]
    pub fn with_update_resource_a<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LinkUpdateEndpointInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.update_resource_a = Some(Arc::new(move |input| Box::pin(f(input))));
        self
    }

    /// Supplies the `update_resource_b` callback.
    #[must_use]
    pub fn with_update_resource_b<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LinkUpdateEndpointInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.update_resource_b = Some(Arc::new(move |input| Box::pin(f(input))));
        self
    }

    /// Supplies the `update_intermediary_resources` callback.
    #[must_use]
    pub fn with_update_intermediary_resources<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LinkUpdateIntermediaryInput, Arc<DeployService>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.update_intermediary_resources = Some(Arc::new(move |input, deploy_service| {
            Box::pin(f(input, deploy_service))
        }));
        self
    }

    /// Supplies the `handle_a_error` callback.
    #[must_use]
    pub fn with_handle_a_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LinkUpdateEndpointInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handle_a_error = Some(Arc::new(move |input| Box::pin(f(input))));
        self
    }

    /// Supplies the `handle_b_error` callback.
    #[must_use]
    pub fn with_handle_b_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LinkUpdateEndpointInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handle_b_error = Some(Arc::new(move |input| Box::pin(f(input))));
        self
    }
}

#[async_trait]
impl LinkCapability for LinkDefinition {
    fn get_type(&self) -> &str {
        &self.link_type
    }

    fn get_kind(&self) -> LinkKind {
        self.kind
    }

    fn get_priority_resource_type(&self) -> &str {
        &self.priority_resource_type
    }

    async fn stage_changes(&self, input: LinkStageChangesInput) -> Result<LinkChanges> {
        match &self.stage_changes {
            Some(f) => f(input).await,
            None => Err(missing(self.link_type(), "stage_changes")),
        }
    }

    async fn update_resource_a(&self, input: LinkUpdateEndpointInput) -> Result<Value> {
        match &self.update_resource_a {
            Some(f) => f(input).await,
            None => Ok(Value::Null),
        }
    }

    async fn update_resource_b(&self, input: LinkUpdateEndpointInput) -> Result<Value> {
        match &self.update_resource_b {
            Some(f) => f(input).await,
            None => Ok(Value::Null),
        }
    }

    async fn update_intermediary_resources(
        &self,
        input: LinkUpdateIntermediaryInput,
        deploy_service: &DeployService,
    ) -> Result<Value> {
        match &self.update_intermediary_resources {
            Some(f) => {
                // The callback takes an owned handle so it can hold it across awaits
                // freely; callers construct `ProviderPluginDefinition` with an
                // `Arc<DeployService>` for exactly this reason.
                f(input, Arc::new(DeployService::clone(deploy_service))).await
            }
            None => Ok(Value::Null),
        }
    }

    async fn handle_a_error(&self, input: LinkUpdateEndpointInput) -> Result<()> {
        match &self.handle_a_error {
            Some(f) => f(input).await,
            None => Ok(()),
        }
    }

    async fn handle_b_error(&self, input: LinkUpdateEndpointInput) -> Result<()> {
        match &self.handle_b_error {
            Some(f) => f(input).await,
            None => Ok(()),
        }
    }
}

/// Aggregates definitions of every kind under one namespace and satisfies
/// [`Provider`] directly — the common case for a plugin author who wants to describe a
/// whole namespace declaratively rather than hand-writing five capability `impl`s.
pub struct ProviderPluginDefinition {
    namespace: String,
    default_retry_policy: Option<RetryPolicy>,
    resources: Vec<Arc<ResourceDefinition>>,
    data_sources: Vec<Arc<DataSourceDefinition>>,
    custom_variable_types: Vec<Arc<CustomVariableTypeDefinition>>,
    functions: Vec<Arc<FunctionPluginDefinition>>,
    links: Vec<Arc<LinkDefinition>>,
}

impl ProviderPluginDefinition {
    /// Starts an empty plugin bundle for `namespace`.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            default_retry_policy: None,
            resources: Vec::new(),
            data_sources: Vec::new(),
            custom_variable_types: Vec::new(),
            functions: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Sets the retry policy this provider prefers when a capability does not supply
    /// its own.
    #[must_use]
    pub fn default_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_retry_policy = Some(policy);
        self
    }

    /// Registers a resource definition.
    #[must_use]
    pub fn with_resource(mut self, definition: ResourceDefinition) -> Self {
        self.resources.push(Arc::new(definition));
        self
    }

    /// Registers a data source definition.
    #[must_use]
    pub fn with_data_source(mut self, definition: DataSourceDefinition) -> Self {
        self.data_sources.push(Arc::new(definition));
        self
    }

    /// Registers a custom variable type definition.
    #[must_use]
    pub fn with_custom_variable_type(mut self, definition: CustomVariableTypeDefinition) -> Self {
        self.custom_variable_types.push(Arc::new(definition));
        self
    }

    /// Registers a function definition.
    #[must_use]
    pub fn with_function(mut self, definition: FunctionPluginDefinition) -> Self {
        self.functions.push(Arc::new(definition));
        self
    }

    /// Registers a link definition.
    #[must_use]
    pub fn with_link(mut self, definition: LinkDefinition) -> Self {
        self.links.push(Arc::new(definition));
        self
    }
}

#[async_trait]
impl Provider for ProviderPluginDefinition {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list_resource_types(&self) -> Result<Vec<String>> {
        Ok(self.resources.iter().map(|r| r.get_type().to_string()).collect())
    }

    async fn list_data_source_types(&self) -> Result<Vec<String>> {
        Ok(self.data_sources.iter().map(|d| d.get_type().to_string()).collect())
    }

    async fn list_custom_variable_types(&self) -> Result<Vec<String>> {
        Ok(self
            .custom_variable_types
            .iter()
            .map(|c| c.get_type().to_string())
            .collect())
    }

    async fn list_function_names(&self) -> Result<Vec<String>> {
        Ok(self
            .functions
            .iter()
            .map(|f| f.get_definition().name)
            .collect())
    }

    async fn resolve_resource(&self, item_type: &str) -> Result<Option<Arc<dyn ResourceCapability>>> {
        Ok(self
            .resources
            .iter()
            .find(|r| r.get_type() == item_type)
            .map(|r| Arc::clone(r) as Arc<dyn ResourceCapability>))
    }

    async fn resolve_data_source(&self, item_type: &str) -> Result<Option<Arc<dyn DataSourceCapability>>> {
        Ok(self
            .data_sources
            .iter()
            .find(|d| d.get_type() == item_type)
            .map(|d| Arc::clone(d) as Arc<dyn DataSourceCapability>))
    }

    async fn resolve_custom_variable_type(
        &self,
        item_type: &str,
    ) -> Result<Option<Arc<dyn CustomVariableTypeCapability>>> {
        Ok(self
            .custom_variable_types
            .iter()
            .find(|c| c.get_type() == item_type)
            .map(|c| Arc::clone(c) as Arc<dyn CustomVariableTypeCapability>))
    }

    async fn resolve_function(&self, name: &str) -> Result<Option<Arc<dyn FunctionCapability>>> {
        Ok(self
            .functions
            .iter()
            .find(|f| f.get_definition().name == name)
            .map(|f| Arc::clone(f) as Arc<dyn FunctionCapability>))
    }

    async fn resolve_link(&self, type_a: &str, type_b: &str) -> Result<Option<Arc<dyn LinkCapability>>> {
        let key = link_id(type_a, type_b);
        Ok(self
            .links
            .iter()
            .find(|l| l.link_type() == key)
            .map(|l| Arc::clone(l) as Arc<dyn LinkCapability>))
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        self.default_retry_policy
    }
}
