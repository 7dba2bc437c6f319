//! Handlebars template for the generated functions entry.

pub const ENTRY_TEMPLATE: &str = r#"// Generated by {{generator}}. Do not edit.
{{#each imports}}
import { {{name}} as {{identifier}} } from {{{path}}};
{{/each}}

const routes = [
{{#each routes}}
  {
    routePath: {{{route_path}}},
    mountPath: {{{mount_path}}},
    method: {{{method}}},
    middlewares: [{{#each middlewares}}{{this}}, {{/each}}],
    modules: [{{#each modules}}{{this}}, {{/each}}],
    exact: { regex: new RegExp({{{exact.source}}}), keys: {{{exact.keys}}} },
    prefix: { regex: new RegExp({{{prefix.source}}}), keys: {{{prefix.keys}}} },
  },
{{/each}}
];

const fallbackService = {{{fallback_service}}};
const d1Databases = {{{d1_databases}}};

function extract(matcher, match) {
  const params = {};
  matcher.keys.forEach((key, index) => {
    const value = match[index + 1];
    if (key.repeat) {
      params[key.name] = value === undefined ? [] : value.split("/").filter(Boolean);
    } else {
      params[key.name] = value;
    }
  });
  return params;
}

function plan(request) {
  const pathname = new URL(request.url).pathname;
  const middlewares = [];
  const handlers = [];
  for (const route of routes) {
    if (route.method && route.method !== request.method) continue;
    const mounted = route.middlewares.length > 0 ? route.prefix.regex.exec(pathname) : null;
    if (mounted) {
      const params = extract(route.prefix, mounted);
      middlewares.unshift(...route.middlewares.map((handler) => ({ handler, params })));
    }
    const exact = route.modules.length > 0 ? route.exact.regex.exec(pathname) : null;
    if (exact) {
      const params = extract(route.exact, exact);
      handlers.push(...route.modules.map((handler) => ({ handler, params })));
    }
  }
  return middlewares.concat(handlers);
}

function bindEnv(env) {
  if (d1Databases.length === 0) return env;
  const bound = Object.assign({}, env);
  for (const name of d1Databases) {
    const beta = env["__D1_BETA__" + name];
    if (beta !== undefined) bound[name] = beta;
  }
  return bound;
}

async function handle(request, env, ctx, pluginArgs, fallback) {
  const queue = plan(request);
  const data = {};
  const next = async (input, init) => {
    if (input !== undefined) request = new Request(input, init);
    const step = queue.shift();
    if (!step) return fallback(request);
    const handlers = Array.isArray(step.handler) ? step.handler : [step.handler];
    queue.unshift(...handlers.slice(1).map((handler) => ({ handler, params: step.params })));
    return handlers[0]({
      request,
      env,
      params: step.params,
      data,
      next,
      pluginArgs,
      waitUntil: (promise) => ctx.waitUntil(promise),
      passThroughOnException: () => ctx.passThroughOnException && ctx.passThroughOnException(),
    });
  };
  return next();
}

{{#if plugin}}
export default function (pluginArgs) {
  return (context) =>
    handle(context.request, bindEnv(context.env), context, pluginArgs, (request) => context.next(request));
}
{{else}}
export default {
  async fetch(request, env, ctx) {
    const bound = bindEnv(env);
    return handle(request, bound, ctx, undefined, (request) => bound[fallbackService].fetch(request));
  },
};
{{/if}}
"#;
